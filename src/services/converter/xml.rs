use super::{ConvertError, RawFormat};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Element {
    name: String,
    members: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, ConvertError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut members = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| ConvertError::payload(RawFormat::Xml, err))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| ConvertError::payload(RawFormat::Xml, err))?;
            insert_member(&mut members, key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            members,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let text = self.text.trim().to_string();
        if self.members.is_empty() {
            return (self.name, Value::String(text));
        }
        if !text.is_empty() {
            self.members.insert(String::new(), Value::String(text));
        }
        (self.name, Value::Object(self.members))
    }
}

// Repeated siblings collapse into an array under the shared name.
fn insert_member(members: &mut Map<String, Value>, name: String, value: Value) {
    match members.get_mut(&name) {
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            members.insert(name, value);
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Value>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => insert_member(&mut parent.members, name, value),
        None => *root = Some(value),
    }
}

pub fn parse_xml(payload: &[u8]) -> Result<Value, ConvertError> {
    let mut reader = Reader::from_reader(payload);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ConvertError::payload(RawFormat::Xml, err))?;
        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Element::open(&start)?.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|err| ConvertError::payload(RawFormat::Xml, err))?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    ConvertError::payload(RawFormat::Xml, "unbalanced closing tag")
                })?;
                let (name, value) = element.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ConvertError::payload(RawFormat::Xml, "unexpected end of document"));
    }
    Ok(root.unwrap_or(Value::Null))
}
