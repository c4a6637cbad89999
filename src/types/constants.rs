//! Layer names and value bounds shared by the traversability map.

pub const LAYER_ELEVATION: &str = "elevation";
pub const LAYER_UPPER_BOUND: &str = "upper_bound";
pub const LAYER_LOWER_BOUND: &str = "lower_bound";
pub const LAYER_UNCERTAINTY_RANGE: &str = "uncertainty_range";

pub const LAYER_TRAVERSABILITY: &str = "traversability";
pub const LAYER_SLOPE: &str = "slope";
pub const LAYER_STEP: &str = "step";
pub const LAYER_ROUGHNESS: &str = "roughness";
pub const LAYER_ROBOT_SLOPE: &str = "robot_slope";

pub const LAYER_SLOPE_FOOTPRINT: &str = "slope_footprint";
pub const LAYER_STEP_FOOTPRINT: &str = "step_footprint";
pub const LAYER_ROUGHNESS_FOOTPRINT: &str = "roughness_footprint";
pub const LAYER_TRAVERSABILITY_FOOTPRINT: &str = "traversability_footprint";

pub const LAYER_TRAVERSABILITY_X: &str = "traversability_x";
pub const LAYER_TRAVERSABILITY_ROT: &str = "traversability_rot";

pub const LAYER_TERRAIN_TRAVERSABILITY: &str = "terrain_traversability";
pub const LAYER_COLOR: &str = "color";

/// Layers every traversability snapshot must carry.
pub const TRAVERSABILITY_LAYERS: [&str; 4] =
    [LAYER_TRAVERSABILITY, LAYER_SLOPE, LAYER_STEP, LAYER_ROUGHNESS];

/// Per-cell memoization layers, reset with every new snapshot generation.
pub const FOOTPRINT_CACHE_LAYERS: [&str; 4] = [
    LAYER_STEP_FOOTPRINT,
    LAYER_SLOPE_FOOTPRINT,
    LAYER_ROUGHNESS_FOOTPRINT,
    LAYER_TRAVERSABILITY_FOOTPRINT,
];

pub const TRAVERSABILITY_MIN: f32 = 0.0;
pub const TRAVERSABILITY_MAX: f32 = 1.0;
pub const DEFAULT_TRAVERSABILITY: f32 = 0.5;

/// Value stored in a layer cell that holds no data.
pub const INVALID: f32 = f32::NAN;
