//! KML document listing one `GroundOverlay` per tile.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::DEFAULT_DRAW_ORDER;
use crate::error::{OverlayError, Result};
use crate::model::ExtractedTile;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
/// Entry name viewers look for inside a KMZ package.
pub const DOC_ENTRY_NAME: &str = "doc.kml";

#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    draw_order: i32,
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self {
            draw_order: DEFAULT_DRAW_ORDER,
        }
    }
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draw_order(mut self, draw_order: i32) -> Self {
        self.draw_order = draw_order;
        self
    }

    /// Render the document named `document_name`, one entry per tile in the
    /// order given. Image references are relative file names.
    pub fn build(&self, document_name: &str, tiles: &[ExtractedTile]) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(descriptor_error)?;
        let mut kml = BytesStart::new("kml");
        kml.push_attribute(("xmlns", KML_NAMESPACE));
        writer
            .write_event(Event::Start(kml))
            .map_err(descriptor_error)?;
        start(&mut writer, "Document")?;
        text_element(&mut writer, "name", document_name)?;

        for tile in tiles {
            self.write_overlay(&mut writer, tile)?;
        }

        end(&mut writer, "Document")?;
        end(&mut writer, "kml")?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(descriptor_error)
    }

    fn write_overlay(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        tile: &ExtractedTile,
    ) -> Result<()> {
        start(writer, "GroundOverlay")?;
        text_element(writer, "name", &tile.spec.name)?;
        writer
            .write_event(Event::Empty(BytesStart::new("description")))
            .map_err(descriptor_error)?;
        text_element(writer, "drawOrder", &self.draw_order.to_string())?;

        start(writer, "Icon")?;
        text_element(writer, "href", &tile.image_file_name())?;
        end(writer, "Icon")?;

        start(writer, "LatLonBox")?;
        text_element(writer, "north", &tile.bbox.north.to_string())?;
        text_element(writer, "south", &tile.bbox.south.to_string())?;
        text_element(writer, "east", &tile.bbox.east.to_string())?;
        text_element(writer, "west", &tile.bbox.west.to_string())?;
        text_element(writer, "rotation", "0.0")?;
        end(writer, "LatLonBox")?;

        end(writer, "GroundOverlay")
    }
}

fn start(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(descriptor_error)
}

fn end(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(descriptor_error)
}

fn text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(descriptor_error)?;
    end(writer, name)
}

fn descriptor_error(e: impl std::fmt::Display) -> OverlayError {
    OverlayError::packaging(DOC_ENTRY_NAME, e)
}
