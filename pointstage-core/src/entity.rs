//! Host-side object graph

use crate::point_cloud::PointCloud;

/// Kind of entity a host can ask a filter to save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    PointCloud,
    Mesh,
    Group,
}

/// A group that receives loaded clouds. Children are owned by the group once
/// added.
#[derive(Debug, Default)]
pub struct EntityGroup {
    children: Vec<PointCloud>,
}

impl EntityGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `cloud`
    pub fn add_child(&mut self, cloud: PointCloud) {
        self.children.push(cloud);
    }

    pub fn children(&self) -> &[PointCloud] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn into_children(self) -> Vec<PointCloud> {
        self.children
    }
}
