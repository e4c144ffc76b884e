//! XML deserialization of clone reports.

use std::fs;
use std::path::Path;

use chrono::DateTime;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{DupscanError, DupscanResult};
use crate::report::model::{
    parse_gaps, CloneClass, CloneInstance, CloneReport, ReportValue, SourceFileDescriptor,
};
use crate::report::writer::TIMESTAMP_FORMAT;

struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    fn from_element(element: &BytesStart<'_>) -> DupscanResult<Self> {
        let mut pairs = Vec::new();
        for attribute in element.attributes() {
            let attribute =
                attribute.map_err(|e| DupscanError::Report(format!("bad attribute: {e}")))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> DupscanResult<&str> {
        self.get(key)
            .ok_or_else(|| DupscanError::Report(format!("missing attribute '{key}'")))
    }

    fn required_number<T: std::str::FromStr>(&self, key: &str) -> DupscanResult<T> {
        let text = self.required(key)?;
        text.parse()
            .map_err(|_| DupscanError::Report(format!("attribute '{key}' is not a number: '{text}'")))
    }
}

/// Parses a report from its XML form. Unknown elements are rejected so a
/// truncated or foreign document fails loudly instead of round-tripping
/// into an empty report.
pub fn read_report(xml: &str) -> DupscanResult<CloneReport> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut report = CloneReport::default();
    let mut open_class: Option<CloneClass> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                let attributes = Attributes::from_element(&element)?;
                match name.as_str() {
                    "cloneReport" => {
                        seen_root = true;
                        if let Some(text) = attributes.get("timestamp") {
                            let parsed = DateTime::parse_from_str(text, TIMESTAMP_FORMAT)
                                .map_err(|e| {
                                    DupscanError::Report(format!("bad timestamp '{text}': {e}"))
                                })?;
                            report.timestamp = Some(parsed);
                        }
                    }
                    "values" => {}
                    "value" => {
                        let key = attributes.required("key")?;
                        let type_name = attributes.required("type")?;
                        let value = attributes.required("value")?;
                        report
                            .values
                            .set(key, ReportValue::parse(type_name, value)?);
                    }
                    "sourceFile" => {
                        report.source_files.push(SourceFileDescriptor {
                            id: attributes.required_number("id")?,
                            path: attributes.required("path")?.to_string(),
                            location: attributes.required("location")?.to_string(),
                            length: attributes.required_number("length")?,
                            fingerprint: attributes.required("fingerprint")?.to_string(),
                        });
                    }
                    "cloneClass" => {
                        open_class = Some(CloneClass {
                            id: attributes.required_number("id")?,
                            normalized_length: attributes.required_number("normalizedLength")?,
                            fingerprint: attributes.required("fingerprint")?.to_string(),
                            clones: Vec::new(),
                        });
                    }
                    "clone" => {
                        let class = open_class.as_mut().ok_or_else(|| {
                            DupscanError::Report("clone element outside cloneClass".to_string())
                        })?;
                        class.clones.push(CloneInstance {
                            id: attributes.required_number("id")?,
                            fingerprint: attributes.required("fingerprint")?.to_string(),
                            start_line: attributes.required_number("startLine")?,
                            end_line: attributes.required_number("endLine")?,
                            start_offset: attributes.required_number("startOffset")?,
                            end_offset: attributes.required_number("endOffset")?,
                            source_file_id: attributes.required_number("sourceFileId")?,
                            start_unit_index_in_file: attributes
                                .required_number("startUnitIndexInFile")?,
                            length_in_units: attributes.required_number("lengthInUnits")?,
                            delta_in_units: attributes.required_number("deltaInUnits")?,
                            gaps: parse_gaps(attributes.get("gaps").unwrap_or(""))?,
                        });
                    }
                    other => {
                        return Err(DupscanError::Report(format!(
                            "unexpected element '{other}'"
                        )));
                    }
                }
            }
            Event::End(element) => {
                if element.name().as_ref() == b"cloneClass" {
                    if let Some(class) = open_class.take() {
                        report.clone_classes.push(class);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(DupscanError::Report("missing cloneReport root".to_string()));
    }
    Ok(report)
}

pub fn read_report_from(path: &Path) -> DupscanResult<CloneReport> {
    let xml = fs::read_to_string(path)?;
    read_report(&xml)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
