//! Dimension classification and scalar field preparation

use crate::events::{EventSink, LoadEvent};
use pointstage_core::{DimensionId, Result, ScalarField};

/// X, Y or Z
pub fn is_coordinate(id: DimensionId) -> bool {
    matches!(id, DimensionId::X | DimensionId::Y | DimensionId::Z)
}

/// Red, Green or Blue
pub fn is_color(id: DimensionId) -> bool {
    matches!(id, DimensionId::Red | DimensionId::Green | DimensionId::Blue)
}

/// Any dimension that becomes a generic scalar field
pub fn is_scalar_attribute(id: DimensionId) -> bool {
    !is_coordinate(id) && !is_color(id)
}

/// Scalar buffers keyed by dimension, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ScalarFieldMap {
    entries: Vec<(DimensionId, ScalarField)>,
}

impl ScalarFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, id: DimensionId, field: ScalarField) {
        self.entries.push((id, field));
    }

    pub fn get(&self, id: DimensionId) -> Option<&ScalarField> {
        self.entries.iter().find(|(key, _)| *key == id).map(|(_, f)| f)
    }

    pub fn keys(&self) -> impl Iterator<Item = DimensionId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, &ScalarField)> {
        self.entries.iter().map(|(id, f)| (*id, f))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (DimensionId, &mut ScalarField)> {
        self.entries.iter_mut().map(|(id, f)| (*id, f))
    }
}

impl IntoIterator for ScalarFieldMap {
    type Item = (DimensionId, ScalarField);
    type IntoIter = std::vec::IntoIter<(DimensionId, ScalarField)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Create one scalar field per generic scalar dimension, each with room for
/// `point_count` values.
pub fn create_scalar_field_map(
    dims: &[DimensionId],
    point_count: usize,
    events: &dyn EventSink,
) -> ScalarFieldMap {
    create_scalar_field_map_with(dims, point_count, events, |field, count| {
        field.try_reserve(count)
    })
}

/// Like [`create_scalar_field_map`], with a custom reservation strategy.
///
/// The first field that fails to reserve is dropped with a warning, and no
/// further dimension is considered.
pub fn create_scalar_field_map_with<F>(
    dims: &[DimensionId],
    point_count: usize,
    events: &dyn EventSink,
    mut reserve: F,
) -> ScalarFieldMap
where
    F: FnMut(&mut ScalarField, usize) -> Result<()>,
{
    let mut map = ScalarFieldMap::new();
    for &id in dims.iter().filter(|id| is_scalar_attribute(**id)) {
        let name = id.name();
        let mut field = ScalarField::new(name);
        if reserve(&mut field, point_count).is_err() {
            events.emit(
                LoadEvent::warning(format!("Not enough memory: '{}' field will be ignored!", name))
                    .with_field(name),
            );
            break;
        }
        map.insert(id, field);
    }
    map
}
