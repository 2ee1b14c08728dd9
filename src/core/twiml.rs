//! TwiML serialization for control documents
//!
//! Maps each instruction onto the provider's voice markup:
//!
//! | Instruction | Markup |
//! |---|---|
//! | `Speak { text }` | `<Say>text</Say>` |
//! | `Dial { target, caller_id_override }` | `<Dial callerId="...">target</Dial>` |
//! | `Reject` | `<Reject/>` |
//!
//! Text and attribute values are XML-escaped by the writer.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::document::{ControlDocument, ControlInstruction, DocumentError};

/// Content type the provider expects for call-control responses
pub const TWIML_CONTENT_TYPE: &str = "text/xml";

/// Serialized form of [`ControlDocument::error`], served if serialization itself fails
pub const FALLBACK_ERROR_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Say>An error occurred while processing your call.</Say><Reject/></Response>";

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::Serialization(e.to_string()))
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: BytesStart<'_>,
    text: &str,
) -> Result<(), DocumentError> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    write(writer, Event::Start(element))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// Serialize a control document to TwiML
pub fn to_twiml(document: &ControlDocument) -> Result<String, DocumentError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("Response")))?;

    for instruction in document.instructions() {
        match instruction {
            ControlInstruction::Speak { text } => {
                write_text_element(&mut writer, BytesStart::new("Say"), text)?;
            }
            ControlInstruction::Dial {
                target,
                caller_id_override,
            } => {
                let mut dial = BytesStart::new("Dial");
                if let Some(caller_id) = caller_id_override {
                    dial.push_attribute(("callerId", caller_id.as_str()));
                }
                write_text_element(&mut writer, dial, target)?;
            }
            ControlInstruction::Reject => {
                write(&mut writer, Event::Empty(BytesStart::new("Reject")))?;
            }
        }
    }

    write(&mut writer, Event::End(BytesEnd::new("Response")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| DocumentError::Serialization(e.to_string()))
}
