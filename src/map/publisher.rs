use crate::grid::GridMessage;
use crate::types::StampedPolygon;

/// Outputs of the traversability map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    TraversabilityMap,
    TerrainMap,
    FootprintPolygon,
    UntraversablePolygon,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TraversabilityMap => "traversability_map",
            Self::TerrainMap => "terrain_map",
            Self::FootprintPolygon => "footprint_polygon",
            Self::UntraversablePolygon => "untraversable_polygon",
        }
    }
}

/// Sink for maps and polygons. Nothing is serialized for a topic without subscribers.
pub trait MapPublisher: Send + Sync {
    fn subscriber_count(&self, topic: Topic) -> usize;

    fn publish_map(&self, topic: Topic, message: GridMessage);

    fn publish_polygon(&self, topic: Topic, polygon: &StampedPolygon);
}

/// Publisher with no subscribers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl MapPublisher for NullPublisher {
    fn subscriber_count(&self, _topic: Topic) -> usize {
        0
    }

    fn publish_map(&self, _topic: Topic, _message: GridMessage) {}

    fn publish_polygon(&self, _topic: Topic, _polygon: &StampedPolygon) {}
}
