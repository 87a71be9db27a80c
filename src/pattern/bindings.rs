use crate::types::GroupId;

/// Maps capture group ids to the variable names bound to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarGroupBindings {
    names: Vec<Option<String>>,
}

impl VarGroupBindings {
    pub fn new(total_groups: usize) -> Self {
        Self {
            names: vec![None; total_groups],
        }
    }

    pub fn set(&mut self, group: GroupId, name: String) {
        if group >= self.names.len() {
            self.names.resize(group + 1, None);
        }
        self.names[group] = Some(name);
    }

    pub fn name(&self, group: GroupId) -> Option<&str> {
        self.names.get(group).and_then(|n| n.as_deref())
    }

    /// Lowest group id bound to `name`.
    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &str)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(id, n)| n.as_deref().map(|n| (id, n)))
    }
}
