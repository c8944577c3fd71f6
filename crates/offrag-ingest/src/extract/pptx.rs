use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const PRESENTATION: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Text of every slide in deck order.
///
/// Deck order is the `p:sldIdLst` of `ppt/presentation.xml` resolved through
/// its relationships; without that part, slides go by file number. Each
/// text-bearing shape contributes its paragraphs joined by `\n`, followed by
/// `\n`. A slide that cannot be read or parsed contributes `""`, and a deck
/// without slides yields `""`.
pub fn extract_pptx(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| anyhow!("not a readable PPTX: {}", e))?;

    let slides = match deck_order(&mut archive) {
        Ok(Some(parts)) => parts,
        Ok(None) => numbered_slides(&archive),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable slide list, using file order");
            numbered_slides(&archive)
        }
    };

    let mut text = String::new();
    for name in slides {
        let slide = read_part(&mut archive, &name).and_then(|xml| slide_text(&xml)).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), slide = %name, error = %e, "skipping unreadable slide");
            String::new()
        });
        text.push_str(&slide);
    }
    Ok(text)
}

fn read_part<R: Read + std::io::Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// `ppt/slides/slideN.xml` parts sorted by `N`.
fn numbered_slides<R: Read + std::io::Seek>(archive: &zip::ZipArchive<R>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?.parse::<u32>().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, name)| name).collect()
}

/// Slide part names in presentation order, or `None` when the deck has no
/// `presentation.xml` or none of its slide ids resolve.
fn deck_order<R: Read + std::io::Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Option<Vec<String>>> {
    if archive.index_for_name(PRESENTATION).is_none() {
        return Ok(None);
    }
    let ids = slide_rel_ids(&read_part(archive, PRESENTATION)?)?;
    if ids.is_empty() {
        return Ok(Some(Vec::new()));
    }
    let targets = relationship_targets(&read_part(archive, PRESENTATION_RELS)?)?;
    let parts: Vec<String> = ids
        .iter()
        .filter_map(|id| targets.iter().find(|(rid, _)| rid == id).map(|(_, target)| resolve_target(target)))
        .collect();
    Ok(if parts.is_empty() { None } else { Some(parts) })
}

/// `r:id` of each `p:sldId`, in document order.
pub fn slide_rel_ids(presentation_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"r:id" {
                        ids.push(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

fn relationship_targets(rels_xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(rels_xml);
    let mut targets = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let (mut id, mut target) = (None, None);
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.push((id, target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Targets are relative to `ppt/` unless absolute within the package.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Extract shape text from one `slideN.xml` document.
pub fn slide_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut shape: Option<String> = None;
    let mut paragraphs = 0usize;
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:txBody" => {
                    shape = Some(String::new());
                    paragraphs = 0;
                }
                b"a:p" => start_paragraph(shape.as_mut(), &mut paragraphs),
                b"a:t" => in_run_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" => start_paragraph(shape.as_mut(), &mut paragraphs),
                b"a:br" => {
                    if let Some(s) = shape.as_mut() {
                        s.push('\u{b}');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                if let Some(s) = shape.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_run_text = false,
                b"p:txBody" => {
                    if let Some(s) = shape.take() {
                        out.push_str(&s);
                        out.push('\n');
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn start_paragraph(shape: Option<&mut String>, paragraphs: &mut usize) {
    if let Some(s) = shape {
        if *paragraphs > 0 {
            s.push('\n');
        }
        *paragraphs += 1;
    }
}
