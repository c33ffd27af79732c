//! GDI object table
//!
//! Slots are addressed by the handle index stored in CREATE*/SELECTOBJECT/
//! DELETEOBJECT records. The table holds `nHandles + 1` entries; slot 0 is
//! reserved by the format.

use crate::bounds::check_object_index;
use crate::device_context::{DeviceContext, Fill, Font, Stroke};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GdiObject {
    #[default]
    Unset,
    Pen(Stroke),
    Brush(Fill),
    Font(Font),
}

#[derive(Debug, Default)]
pub struct ObjectTable {
    slots: Vec<GdiObject>,
}

impl ObjectTable {
    /// Table for a header declaring `handles` handles.
    pub fn new(handles: u16) -> Self {
        Self { slots: vec![GdiObject::Unset; handles as usize + 1] }
    }

    /// Highest valid index.
    pub fn size(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    pub fn get(&self, index: u32) -> Result<&GdiObject> {
        check_object_index(self.size(), index)?;
        Ok(&self.slots[index as usize])
    }

    pub fn set(&mut self, index: u32, object: GdiObject) -> Result<()> {
        check_object_index(self.size(), index)?;
        self.slots[index as usize] = object;
        Ok(())
    }

    pub fn delete(&mut self, index: u32) -> Result<()> {
        self.set(index, GdiObject::Unset)
    }

    /// Copy the attributes of slot `index` into the device context.
    pub fn select(&self, index: u32, dc: &mut DeviceContext) -> Result<()> {
        match self.get(index)? {
            GdiObject::Pen(stroke) => dc.stroke = stroke.clone(),
            GdiObject::Brush(fill) => dc.fill = fill.clone(),
            GdiObject::Font(font) => dc.font = font.clone(),
            GdiObject::Unset => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_context::{Color, BS_SOLID};
    use crate::error::ConvertError;

    #[test]
    fn test_select_brush_updates_fill_only() {
        let mut table = ObjectTable::new(2);
        let fill = Fill { style: BS_SOLID, color: Color::new(255, 0, 0), ..Default::default() };
        table.set(1, GdiObject::Brush(fill.clone())).unwrap();
        let mut dc = DeviceContext::default();
        let stroke = dc.stroke.clone();
        table.select(1, &mut dc).unwrap();
        assert_eq!(dc.fill, fill);
        assert_eq!(dc.stroke, stroke);
    }

    #[test]
    fn test_index_past_table_is_bounds_error() {
        let mut table = ObjectTable::new(2);
        assert_eq!(table.size(), 2);
        assert!(table.set(2, GdiObject::Unset).is_ok());
        assert!(matches!(table.get(3), Err(ConvertError::Bounds(_))));
        assert!(matches!(table.delete(u32::MAX), Err(ConvertError::Bounds(_))));
    }

    #[test]
    fn test_delete_clears_slot() {
        let mut table = ObjectTable::new(1);
        table.set(1, GdiObject::Font(Font::default())).unwrap();
        table.delete(1).unwrap();
        assert_eq!(table.get(1).unwrap(), &GdiObject::Unset);
    }
}
