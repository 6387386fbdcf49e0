//! Descriptor and instance registries
//!
//! The descriptor registry is append-only and keeps registration order. The
//! instance registry keeps the most recently started instance first.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::domain::descriptor::{AppDescriptor, AppMode};
use crate::domain::instance::{AppInstance, DataBlock, InstanceId};

/// Position of a descriptor in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub(crate) usize);

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind#{}", self.0)
    }
}

/// Catalog of application kinds
#[derive(Default)]
pub struct DescriptorRegistry {
    descriptors: Vec<Rc<dyn AppDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor
    ///
    /// Names are expected to be unique. A duplicate is still stored but
    /// lookups keep resolving to the first registration.
    pub fn register(&mut self, descriptor: Rc<dyn AppDescriptor>) -> DescriptorId {
        if self.lookup(descriptor.name()).is_some() {
            tracing::warn!(name = descriptor.name(), "duplicate application name registered");
        }
        self.descriptors.push(descriptor);
        DescriptorId(self.descriptors.len() - 1)
    }

    /// Finds the first descriptor with exactly this name
    pub fn lookup(&self, name: &str) -> Option<DescriptorId> {
        self.descriptors
            .iter()
            .position(|d| d.name() == name)
            .map(DescriptorId)
    }

    pub fn get(&self, id: DescriptorId) -> Option<&Rc<dyn AppDescriptor>> {
        self.descriptors.get(id.0)
    }

    /// Returns the descriptor following `prev`, or the first one for `None`
    pub fn next_after(&self, prev: Option<DescriptorId>) -> Option<DescriptorId> {
        let next = prev.map_or(0, |p| p.0 + 1);
        (next < self.descriptors.len()).then_some(DescriptorId(next))
    }

    /// All descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = (DescriptorId, &Rc<dyn AppDescriptor>)> + '_ {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (DescriptorId(i), d))
    }

    /// Descriptors shown in the application chooser
    pub fn listed(&self) -> impl Iterator<Item = (DescriptorId, &Rc<dyn AppDescriptor>)> + '_ {
        self.iter()
            .filter(|(_, d)| !d.mode().contains(AppMode::NOT_LISTED))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Set of running instances, newest first
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: VecDeque<AppInstance>,
    next_id: u32,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new instance at the head of the list
    pub(crate) fn insert(
        &mut self,
        descriptor_id: DescriptorId,
        descriptor: Rc<dyn AppDescriptor>,
        app_data: DataBlock,
    ) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances
            .push_front(AppInstance::new(id, descriptor_id, descriptor, app_data));
        id
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<AppInstance> {
        let index = self.instances.iter().position(|i| i.id() == id)?;
        self.instances.remove(index)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: InstanceId) -> Option<&AppInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut AppInstance> {
        self.instances.iter_mut().find(|i| i.id() == id)
    }

    /// Instances newest first, optionally only those of one descriptor
    pub fn iter(&self, filter: Option<DescriptorId>) -> impl Iterator<Item = &AppInstance> + '_ {
        self.instances
            .iter()
            .filter(move |i| filter.is_none_or(|d| i.descriptor_id() == d))
    }

    /// Returns the instance following `prev` that matches `filter`
    ///
    /// `None` starts from the head. A `prev` that is no longer registered
    /// ends the walk.
    pub fn next_after(
        &self,
        prev: Option<InstanceId>,
        filter: Option<DescriptorId>,
    ) -> Option<InstanceId> {
        let start = match prev {
            None => 0,
            Some(p) => self.instances.iter().position(|i| i.id() == p)? + 1,
        };
        self.instances
            .iter()
            .skip(start)
            .find(|i| filter.is_none_or(|d| i.descriptor_id() == d))
            .map(AppInstance::id)
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.iter().map(AppInstance::id).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::BlockKind;
    use crate::testing::RecordingApp;
    use pretty_assertions::assert_eq;

    fn block() -> DataBlock {
        DataBlock::allocate(BlockKind::App, 4).unwrap()
    }

    #[test]
    fn lookup_returns_registered_descriptor() {
        let mut registry = DescriptorRegistry::new();
        let files = registry.register(RecordingApp::new("Files").into_rc());
        let terminal = registry.register(RecordingApp::new("Terminal").into_rc());

        assert_eq!(registry.lookup("Files"), Some(files));
        assert_eq!(registry.lookup("Terminal"), Some(terminal));
        assert_eq!(registry.lookup("terminal"), None);
        assert_eq!(registry.lookup("Clock"), None);
    }

    #[test]
    fn duplicate_names_resolve_to_first() {
        let mut registry = DescriptorRegistry::new();
        let first = registry.register(RecordingApp::new("Files").into_rc());
        registry.register(RecordingApp::new("Files").into_rc());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("Files"), Some(first));
    }

    #[test]
    fn descriptor_walk_is_restartable() {
        let mut registry = DescriptorRegistry::new();
        let a = registry.register(RecordingApp::new("A").into_rc());
        let b = registry.register(RecordingApp::new("B").into_rc());

        assert_eq!(registry.next_after(None), Some(a));
        assert_eq!(registry.next_after(Some(a)), Some(b));
        assert_eq!(registry.next_after(Some(b)), None);
        // Fresh walk starts over
        assert_eq!(registry.next_after(None), Some(a));
    }

    #[test]
    fn unlisted_descriptors_are_hidden_from_chooser() {
        let mut registry = DescriptorRegistry::new();
        registry.register(RecordingApp::new("Shown").into_rc());
        registry.register(
            RecordingApp::new("Hidden")
                .with_mode(AppMode::NOT_LISTED)
                .into_rc(),
        );

        let names: Vec<_> = registry.listed().map(|(_, d)| d.name().to_owned()).collect();
        assert_eq!(names, vec!["Shown".to_owned()]);
    }

    #[test]
    fn instances_are_newest_first() {
        let mut descriptors = DescriptorRegistry::new();
        let kind = descriptors.register(RecordingApp::new("A").into_rc());
        let dsc = descriptors.get(kind).unwrap().clone();

        let mut instances = InstanceRegistry::new();
        let first = instances.insert(kind, dsc.clone(), block());
        let second = instances.insert(kind, dsc, block());

        assert_ne!(first, second);
        assert_eq!(instances.ids(), vec![second, first]);
        assert_eq!(instances.get(first).unwrap().name(), "A");
    }

    #[test]
    fn filtered_walk_skips_other_kinds() {
        let mut descriptors = DescriptorRegistry::new();
        let files = descriptors.register(RecordingApp::new("Files").into_rc());
        let terminal = descriptors.register(RecordingApp::new("Terminal").into_rc());
        let files_dsc = descriptors.get(files).unwrap().clone();
        let terminal_dsc = descriptors.get(terminal).unwrap().clone();

        let mut instances = InstanceRegistry::new();
        let t1 = instances.insert(terminal, terminal_dsc.clone(), block());
        let f1 = instances.insert(files, files_dsc, block());
        let t2 = instances.insert(terminal, terminal_dsc, block());

        assert_eq!(instances.next_after(None, Some(terminal)), Some(t2));
        assert_eq!(instances.next_after(Some(t2), Some(terminal)), Some(t1));
        assert_eq!(instances.next_after(Some(t1), Some(terminal)), None);
        assert_eq!(instances.next_after(Some(t2), None), Some(f1));

        let all: Vec<_> = instances.iter(None).map(AppInstance::id).collect();
        assert_eq!(all, vec![t2, f1, t1]);
    }

    #[test]
    fn removed_instance_no_longer_resolves() {
        let mut descriptors = DescriptorRegistry::new();
        let kind = descriptors.register(RecordingApp::new("A").into_rc());
        let dsc = descriptors.get(kind).unwrap().clone();

        let mut instances = InstanceRegistry::new();
        let id = instances.insert(kind, dsc, block());
        assert!(instances.remove(id).is_some());
        assert!(!instances.contains(id));
        assert!(instances.remove(id).is_none());
        assert_eq!(instances.next_after(Some(id), None), None);
    }
}
