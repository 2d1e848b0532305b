use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::des::DesRecord;
use crate::image::ImageRecord;
use crate::tre::TreRecord;
use crate::types::IsdFile;

impl Serialize for TreRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TreRecord", 3)?;
        state.serialize_field("tag", &self.tag())?;
        state.serialize_field("length", &self.length())?;
        state.serialize_field("payload", &self.payload_text())?;
        state.end()
    }
}

impl Serialize for DesRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("DesRecord", 4)?;
        state.serialize_field("type_id", &self.type_id())?;
        state.serialize_field("header_length", &self.header().len())?;
        state.serialize_field("data_length", &self.data().len())?;
        state.serialize_field("data", &String::from_utf8_lossy(self.data()))?;
        state.end()
    }
}

impl Serialize for ImageRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ImageRecord", 5)?;
        state.serialize_field("index", &self.index())?;
        state.serialize_field("offset", &self.offset())?;
        state.serialize_field("subheader_length", &self.subheader().len())?;
        state.serialize_field("data_length", &self.data_length())?;
        state.serialize_field("tres", self.tres())?;
        state.end()
    }
}

impl Serialize for IsdFile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("IsdFile", 9)?;
        state.serialize_field("format", self.format_tag())?;
        state.serialize_field("file_length", &self.file_length)?;
        state.serialize_field("header_length", &self.header_length)?;
        state.serialize_field("segments", &self.segments)?;
        state.serialize_field("des_offset", &self.des_offset)?;
        state.serialize_field("file_tres", &self.file_tres)?;
        state.serialize_field("images", &self.images)?;
        state.serialize_field("des_records", &self.des_records)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.end()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::des::DesRecord;
    use crate::error::Result;
    use crate::tre::TreRecord;

    #[test]
    fn tre_payload_serializes_as_text() -> Result<()> {
        let tre = TreRecord::new(*b"TEST  ", b"hello\0".as_slice())?;

        assert_eq!(
            serde_json::to_value(&tre).ok(),
            Some(json!({ "tag": "TEST  ", "length": 6, "payload": "hello" }))
        );

        Ok(())
    }

    #[test]
    fn des_serializes_type_id() {
        let des = DesRecord::new(format!("DE{:<25}", "XML_DATA_CONTENT"), "<SICD/>");

        let value = serde_json::to_value(&des).ok();
        assert_eq!(
            value,
            Some(json!({
                "type_id": "XML_DATA_CONTENT",
                "header_length": 27,
                "data_length": 7,
                "data": "<SICD/>",
            }))
        );
    }
}
