//! Run-aware placeholder substitution inside WordprocessingML parts.

use crate::error::{Result, StampError};
use crate::placeholder::{find_placeholders, Resolver};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";

/// Whether an archive entry carries stampable body text
fn is_stamped_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    if file.contains('/') || !file.ends_with(".xml") {
        return false;
    }
    file == "document.xml"
        || file == "footnotes.xml"
        || file == "endnotes.xml"
        || file.starts_with("header")
        || file.starts_with("footer")
}

/// Check that bytes form a docx archive with a main document part
pub(crate) fn validate(template: &[u8]) -> Result<()> {
    let archive = ZipArchive::new(Cursor::new(template))?;
    if archive.file_names().any(|name| name == DOCUMENT_PART) {
        Ok(())
    } else {
        Err(StampError::MissingPart(DOCUMENT_PART.to_string()))
    }
}

/// Copy the template archive, substituting placeholders in text parts
pub(crate) fn stamp_archive(template: &[u8], resolver: &Resolver<'_>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !is_stamped_part(entry.name()) {
            writer.raw_copy_file(entry)?;
            continue;
        }

        let name = entry.name().to_string();
        let mut xml = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut xml)?;
        let (stamped, count) = stamp_part(&xml, resolver)?;
        tracing::debug!("Substituted {} placeholders in {}", count, name);

        writer.start_file(name, options)?;
        writer.write_all(&stamped)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// A `w:t` text node belonging to a paragraph
struct TextSegment {
    /// Index of the `<w:t>` start event
    start: usize,
    /// Index of the text event
    text: usize,
    value: String,
}

/// Substitute placeholders in one XML part.
///
/// Placeholders may span several runs of a paragraph. The substituted value
/// is written to the run where the placeholder starts; the remainder of the
/// token is removed from the following runs, which keep their formatting.
pub(crate) fn stamp_part(xml: &[u8], resolver: &Resolver<'_>) -> Result<(Vec<u8>, usize)> {
    let mut reader = Reader::from_reader(xml);
    let mut events: Vec<Event<'static>> = Vec::new();
    let mut paragraphs: Vec<Vec<TextSegment>> = Vec::new();
    let mut open_text: Option<usize> = None;
    let mut count = 0;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => paragraphs.push(Vec::new()),
            Event::Start(e) if e.name().as_ref() == TEXT => open_text = Some(events.len()),
            Event::End(e) if e.name().as_ref() == TEXT => open_text = None,
            Event::End(e) if e.name().as_ref() == PARAGRAPH => {
                if let Some(segments) = paragraphs.pop() {
                    count += rewrite_paragraph(&mut events, &segments, resolver)?;
                }
            }
            Event::Text(e) => {
                if let (Some(start), Some(segments)) = (open_text, paragraphs.last_mut()) {
                    segments.push(TextSegment {
                        start,
                        text: events.len(),
                        value: e.unescape().map_err(quick_xml::Error::from)?.into_owned(),
                    });
                }
            }
            _ => {}
        }
        events.push(event.into_owned());
    }

    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    for event in events {
        writer.write_event(event)?;
    }
    Ok((writer.into_inner(), count))
}

/// Rewrite the text nodes of a closed paragraph; returns the number of
/// placeholders substituted.
fn rewrite_paragraph(
    events: &mut [Event<'static>],
    segments: &[TextSegment],
    resolver: &Resolver<'_>,
) -> Result<usize> {
    let joined: String = segments.iter().map(|s| s.value.as_str()).collect();
    let placeholders = find_placeholders(&joined);
    if placeholders.is_empty() {
        return Ok(0);
    }

    let replacements = placeholders
        .iter()
        .map(|p| Ok((p.span.clone(), resolver.resolve(p)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut offset = 0;
    for segment in segments {
        let range = offset..offset + segment.value.len();
        offset = range.end;

        let rewritten = splice(&joined, range, &replacements);
        if rewritten == segment.value {
            continue;
        }
        events[segment.text] =
            Event::Text(BytesText::from_escaped(partial_escape(rewritten.as_str())).into_owned());
        if let Event::Start(start) = &events[segment.start] {
            let preserved = preserve_space(start);
            events[segment.start] = Event::Start(preserved);
        }
    }

    Ok(replacements.len())
}

/// The new text of the segment covering `range` of the joined paragraph
/// text. A replacement is emitted by the segment holding its first byte.
fn splice(joined: &str, range: Range<usize>, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::new();
    let mut pos = range.start;

    while pos < range.end {
        if let Some((span, value)) = replacements.iter().find(|(span, _)| span.contains(&pos)) {
            if pos == span.start {
                out.push_str(value);
            }
            pos = span.end.min(range.end);
            continue;
        }

        let next = replacements
            .iter()
            .map(|(span, _)| span.start)
            .filter(|&start| start > pos)
            .min()
            .unwrap_or(range.end)
            .min(range.end);
        out.push_str(&joined[pos..next]);
        pos = next;
    }

    out
}

/// Copy of a `<w:t>` start tag with `xml:space="preserve"`
fn preserve_space(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut updated = BytesStart::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() != b"xml:space" {
            updated.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    updated.push_attribute(("xml:space", "preserve"));
    updated
}
