//! XML serialization of clone reports.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::errors::{DupscanError, DupscanResult};
use crate::report::model::{format_gaps, CloneReport};

pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S:%3f%z";

/// Serializes a report to an XML string.
///
/// The report is sorted into canonical order first, so two equivalent
/// reports always serialize byte-identically.
pub fn write_report(report: &CloneReport) -> DupscanResult<String> {
    let mut sorted = report.clone();
    sorted.sort_for_output();

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("cloneReport");
    if let Some(timestamp) = sorted.timestamp {
        root.push_attribute((
            "timestamp",
            timestamp.format(TIMESTAMP_FORMAT).to_string().as_str(),
        ));
    }
    writer.write_event(Event::Start(root))?;

    if !sorted.values.is_persistently_empty() {
        writer.write_event(Event::Start(BytesStart::new("values")))?;
        for (key, value) in sorted.values.persistent_entries() {
            let mut element = BytesStart::new("value");
            element.push_attribute(("key", key));
            element.push_attribute(("type", value.type_name()));
            element.push_attribute(("value", value.render().as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("values")))?;
    }

    for file in &sorted.source_files {
        let mut element = BytesStart::new("sourceFile");
        element.push_attribute(("id", file.id.to_string().as_str()));
        element.push_attribute(("path", file.path.as_str()));
        element.push_attribute(("location", file.location.as_str()));
        element.push_attribute(("length", file.length.to_string().as_str()));
        element.push_attribute(("fingerprint", file.fingerprint.as_str()));
        writer.write_event(Event::Empty(element))?;
    }

    for class in &sorted.clone_classes {
        let mut element = BytesStart::new("cloneClass");
        element.push_attribute(("normalizedLength", class.normalized_length.to_string().as_str()));
        element.push_attribute(("id", class.id.to_string().as_str()));
        element.push_attribute(("fingerprint", class.fingerprint.as_str()));
        writer.write_event(Event::Start(element))?;

        for clone in &class.clones {
            let mut element = BytesStart::new("clone");
            element.push_attribute(("id", clone.id.to_string().as_str()));
            element.push_attribute(("fingerprint", clone.fingerprint.as_str()));
            element.push_attribute(("startLine", clone.start_line.to_string().as_str()));
            element.push_attribute(("endLine", clone.end_line.to_string().as_str()));
            element.push_attribute(("startOffset", clone.start_offset.to_string().as_str()));
            element.push_attribute(("endOffset", clone.end_offset.to_string().as_str()));
            element.push_attribute(("sourceFileId", clone.source_file_id.to_string().as_str()));
            element.push_attribute((
                "startUnitIndexInFile",
                clone.start_unit_index_in_file.to_string().as_str(),
            ));
            element.push_attribute(("lengthInUnits", clone.length_in_units.to_string().as_str()));
            element.push_attribute(("deltaInUnits", clone.delta_in_units.to_string().as_str()));
            element.push_attribute(("gaps", format_gaps(&clone.gaps).as_str()));
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("cloneClass")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("cloneReport")))?;

    let bytes = writer.into_inner();
    String::from_utf8(bytes)
        .map_err(|e| DupscanError::Report(format!("serialized report is not UTF-8: {e}")))
}

pub fn write_report_to(path: &Path, report: &CloneReport) -> DupscanResult<()> {
    let xml = write_report(report)?;
    fs::write(path, xml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
