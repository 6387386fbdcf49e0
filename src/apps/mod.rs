//! Sample application kinds
//!
//! `Example` sends text over its connections, `Terminal` prints what it
//! receives. Both keep their state in the instance data blocks.

pub mod example;
pub mod terminal;

use std::rc::Rc;

use crate::domain::descriptor::AppDescriptor;
use crate::ui::toolkit::ElementId;

pub use example::Example;
pub use terminal::Terminal;

/// Descriptors of the bundled applications, in registration order
pub fn builtin() -> Vec<Rc<dyn AppDescriptor>> {
    vec![Rc::new(Example), Rc::new(Terminal)]
}

fn read_u32(block: &[u8]) -> u32 {
    block
        .get(..4)
        .map_or(0, |b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn write_u32(block: &mut [u8], value: u32) {
    if let Some(b) = block.get_mut(..4) {
        b.copy_from_slice(&value.to_le_bytes());
    }
}

/// Label handle kept in a data block, stored off by one so a zeroed block reads as none
fn read_label(block: &[u8]) -> Option<ElementId> {
    read_u32(block).checked_sub(1).map(ElementId::from_raw)
}

fn write_label(block: &mut [u8], label: ElementId) {
    write_u32(block, label.raw().saturating_add(1));
}
