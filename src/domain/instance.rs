//! Running application instances and their private data blocks
//!
//! Each instance owns up to three byte blocks sized by its descriptor. The
//! app block lives as long as the instance, the shortcut and window blocks
//! live exactly as long as the matching visual element. The pairing is held
//! in the types: a block only exists inside the slot of the element it
//! belongs to.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::domain::descriptor::AppDescriptor;
use crate::domain::registry::DescriptorId;
use crate::ui::toolkit::ElementId;

/// Stable identifier of a running instance
///
/// Identifiers are never reused within one shell, so a stale id held by a
/// pending animation or a UI event simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app#{}", self.0)
    }
}

/// Which of the three private blocks an allocation is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    App,
    Shortcut,
    Window,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::App => f.write_str("application"),
            BlockKind::Shortcut => f.write_str("shortcut"),
            BlockKind::Window => f.write_str("window"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot allocate {size} bytes for the {block} data block")]
pub struct AllocError {
    pub block: BlockKind,
    pub size: usize,
}

/// Fixed-size private byte block, wiped when released
#[derive(Debug)]
pub struct DataBlock {
    block: BlockKind,
    bytes: Box<[u8]>,
}

impl DataBlock {
    /// Allocates a zero-filled block of `size` bytes
    ///
    /// # Returns
    /// The block, or AllocError if the memory could not be reserved
    pub fn allocate(block: BlockKind, size: usize) -> Result<Self, AllocError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| AllocError { block, size })?;
        bytes.resize(size, 0);
        Ok(Self {
            block,
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn kind(&self) -> BlockKind {
        self.block
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for DataBlock {
    fn drop(&mut self) {
        self.bytes.fill(0);
        std::hint::black_box(&self.bytes);
    }
}

/// Where an instance is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    /// Close was requested and waits for the window to animate out
    ClosePending,
    /// Teardown is in progress
    Closing,
}

/// Open shortcut of an instance
#[derive(Debug)]
pub(crate) struct ShortcutSlot {
    pub(crate) element: ElementId,
    pub(crate) title: Option<ElementId>,
    pub(crate) data: DataBlock,
}

/// Open window of an instance
#[derive(Debug)]
pub(crate) struct WindowSlot {
    pub(crate) element: ElementId,
    pub(crate) data: DataBlock,
}

/// One running occurrence of a descriptor
pub struct AppInstance {
    id: InstanceId,
    descriptor_id: DescriptorId,
    descriptor: Rc<dyn AppDescriptor>,
    name: String,
    app_data: DataBlock,
    shortcut: Option<ShortcutSlot>,
    window: Option<WindowSlot>,
    lifecycle: Lifecycle,
}

impl AppInstance {
    pub(crate) fn new(
        id: InstanceId,
        descriptor_id: DescriptorId,
        descriptor: Rc<dyn AppDescriptor>,
        app_data: DataBlock,
    ) -> Self {
        let name = descriptor.name().to_owned();
        Self {
            id,
            descriptor_id,
            descriptor,
            name,
            app_data,
            shortcut: None,
            window: None,
            lifecycle: Lifecycle::Running,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn descriptor_id(&self) -> DescriptorId {
        self.descriptor_id
    }

    pub fn descriptor(&self) -> &Rc<dyn AppDescriptor> {
        &self.descriptor
    }

    /// Current display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn app_data(&self) -> &DataBlock {
        &self.app_data
    }

    pub fn app_data_mut(&mut self) -> &mut DataBlock {
        &mut self.app_data
    }

    /// Shortcut element, present iff a shortcut is open
    pub fn shortcut(&self) -> Option<ElementId> {
        self.shortcut.as_ref().map(|slot| slot.element)
    }

    pub fn shortcut_title(&self) -> Option<ElementId> {
        self.shortcut.as_ref().and_then(|slot| slot.title)
    }

    pub fn shortcut_data(&self) -> Option<&DataBlock> {
        self.shortcut.as_ref().map(|slot| &slot.data)
    }

    pub fn shortcut_data_mut(&mut self) -> Option<&mut DataBlock> {
        self.shortcut.as_mut().map(|slot| &mut slot.data)
    }

    /// Window element, present iff a window is open
    pub fn window(&self) -> Option<ElementId> {
        self.window.as_ref().map(|slot| slot.element)
    }

    pub fn window_data(&self) -> Option<&DataBlock> {
        self.window.as_ref().map(|slot| &slot.data)
    }

    pub fn window_data_mut(&mut self) -> Option<&mut DataBlock> {
        self.window.as_mut().map(|slot| &mut slot.data)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn attach_shortcut(&mut self, slot: ShortcutSlot) {
        debug_assert!(self.shortcut.is_none());
        self.shortcut = Some(slot);
    }

    pub(crate) fn detach_shortcut(&mut self) -> Option<ShortcutSlot> {
        self.shortcut.take()
    }

    pub(crate) fn attach_window(&mut self, slot: WindowSlot) {
        debug_assert!(self.window.is_none());
        self.window = Some(slot);
    }

    pub(crate) fn detach_window(&mut self) -> Option<WindowSlot> {
        self.window.take()
    }
}

impl fmt::Debug for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInstance")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor.name())
            .field("name", &self.name)
            .field("shortcut", &self.shortcut())
            .field("window", &self.window())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
