use std::fs;
use std::io::Write;
use std::path::Path;

use docx_rs::{BreakType, Docx, Hyperlink, HyperlinkType, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use offrag_core::Error;
use offrag_ingest::extract::{slide_rel_ids, slide_text};
use offrag_ingest::{CorpusLoader, DocumentFormat};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let mut docx = Docx::new();
    for p in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
    }
    let file = fs::File::create(path).unwrap();
    docx.build().pack(file).unwrap();
}

fn slide_xml(shapes: &[&[&str]]) -> String {
    let mut body = String::new();
    for paragraphs in shapes {
        body.push_str("<p:sp><p:txBody><a:bodyPr/>");
        for p in *paragraphs {
            body.push_str(&format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"));
        }
        body.push_str("</p:txBody></p:sp>");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
         <p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"
    )
}

fn write_pptx(path: &Path, slides: &[(u32, String)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (n, xml) in slides {
        zip.start_file(format!("ppt/slides/slide{n}.xml"), SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Deck whose `presentation.xml` lists slides in `order`, independent of file numbers.
fn write_ordered_pptx(path: &Path, slides: &[(u32, String)], order: &[u32]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (n, xml) in slides {
        zip.start_file(format!("ppt/slides/slide{n}.xml"), SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }
    let ids: String = order
        .iter()
        .enumerate()
        .map(|(i, n)| format!("<p:sldId id=\"{}\" r:id=\"rId{n}\"/>", 256 + i))
        .collect();
    let presentation = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"
    );
    zip.start_file("ppt/presentation.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(presentation.as_bytes()).unwrap();
    let rels: String = slides
        .iter()
        .map(|(n, _)| format!("<Relationship Id=\"rId{n}\" Type=\"slide\" Target=\"slides/slide{n}.xml\"/>"))
        .collect();
    let rels = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{rels}</Relationships>"
    );
    zip.start_file("ppt/_rels/presentation.xml.rels", SimpleFileOptions::default()).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Two-page PDF: page one draws `text`, page two has no content stream.
fn write_pdf(path: &Path, text: &str) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let written = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources_id,
        "Contents" => content_id,
    });
    let blank = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![written.into(), blank.into()],
        "Count" => 2,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn format_dispatch_by_extension() {
    assert_eq!(DocumentFormat::from_path(Path::new("a.PDF")), Some(DocumentFormat::Pdf));
    assert_eq!(DocumentFormat::from_path(Path::new("a.doc")), Some(DocumentFormat::Docx));
    assert_eq!(DocumentFormat::from_path(Path::new("a.docx")), Some(DocumentFormat::Docx));
    assert_eq!(DocumentFormat::from_path(Path::new("a.pptx")), Some(DocumentFormat::Pptx));
    assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
    assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
}

#[test]
fn slide_text_joins_paragraphs_and_shapes() {
    let xml = slide_xml(&[&["Title"], &["first point", "second &amp; last"]]);
    let text = slide_text(&xml).expect("parse");
    assert_eq!(text, "Title\nfirst point\nsecond & last\n");
}

#[test]
fn docx_paragraphs_are_newline_joined() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.docx");
    write_docx(&path, &["First paragraph.", "Second paragraph."]);
    let text = DocumentFormat::Docx.extract(&path).expect("extract");
    assert!(text.contains("First paragraph.\nSecond paragraph."), "got {text:?}");
}

#[test]
fn docx_reads_hyperlink_runs_and_breaks() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("linked.docx");
    let paragraph = Paragraph::new()
        .add_run(Run::new().add_text("See "))
        .add_hyperlink(Hyperlink::new("https://example.com/manual", HyperlinkType::External).add_run(Run::new().add_text("the manual")))
        .add_run(Run::new().add_text(" now").add_break(BreakType::TextWrapping).add_text("then rest"));
    let file = fs::File::create(&path).unwrap();
    Docx::new().add_paragraph(paragraph).build().pack(file).unwrap();

    let text = DocumentFormat::Docx.extract(&path).expect("extract");
    assert_eq!(text, "See the manual now\nthen rest");
}

#[test]
fn pdf_pages_end_with_newline_and_blank_pages_add_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("two_pages.pdf");
    write_pdf(&path, "Hello offline world");
    let text = DocumentFormat::Pdf.extract(&path).expect("extract");
    assert_eq!(text, "Hello offline world\n");
}

#[test]
fn pptx_follows_deck_order_not_file_numbers() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("reordered.pptx");
    write_ordered_pptx(
        &path,
        &[(1, slide_xml(&[&["shown second"]])), (2, slide_xml(&[&["shown first"]]))],
        &[2, 1],
    );
    let text = DocumentFormat::Pptx.extract(&path).expect("extract");
    assert_eq!(text, "shown first\nshown second\n");
}

#[test]
fn pptx_without_slides_is_an_empty_document() {
    let tmp = TempDir::new().unwrap();
    write_ordered_pptx(&tmp.path().join("empty.pptx"), &[], &[]);
    write_pptx(&tmp.path().join("bare.pptx"), &[]);

    let report = CorpusLoader::new(tmp.path()).load().expect("load");
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.documents.len(), 2);
    assert!(report.documents.iter().all(|d| d.text.is_empty()));
}

#[test]
fn slide_ids_are_read_in_document_order() {
    let xml = "<p:presentation xmlns:p=\"p\" xmlns:r=\"r\"><p:sldIdLst>\
               <p:sldId id=\"257\" r:id=\"rId7\"/><p:sldId id=\"256\" r:id=\"rId2\"/>\
               </p:sldIdLst></p:presentation>";
    assert_eq!(slide_rel_ids(xml).expect("parse"), vec!["rId7", "rId2"]);
}

#[test]
fn pptx_slides_follow_slide_number_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deck.pptx");
    write_pptx(
        &path,
        &[
            (10, slide_xml(&[&["ten"]])),
            (2, slide_xml(&[&["two"]])),
            (3, "<p:sld><broken".to_string()),
        ],
    );
    let text = DocumentFormat::Pptx.extract(&path).expect("extract");
    assert_eq!(text, "two\nten\n", "broken slide contributes nothing");
}

#[test]
fn corrupt_file_does_not_abort_the_batch() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write_docx(&dir.join("good.docx"), &["Alpha beta gamma."]);
    write_pptx(&dir.join("slides.pptx"), &[(1, slide_xml(&[&["Delta"]]))]);
    fs::write(dir.join("broken.pdf"), b"%PDF-1.4 this is not really a pdf").unwrap();
    fs::write(dir.join("legacy.doc"), b"\xd0\xcf\x11\xe0 binary word").unwrap();
    fs::write(dir.join("readme.txt"), "ignored").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    write_docx(&dir.join("nested").join("deep.docx"), &["not loaded"]);

    let report = CorpusLoader::new(dir).load().expect("load");

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.files_seen(), 4);
    for failure in &report.failures {
        assert!(matches!(failure.error, Error::Ingestion { .. }));
    }
    for (i, doc) in report.documents.iter().enumerate() {
        assert_eq!(doc.id, i, "ids follow load order");
        assert!(!doc.text.contains("not loaded"), "no recursion into subdirectories");
    }
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = CorpusLoader::new(tmp.path().join("absent")).load();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn empty_directory_yields_empty_report() {
    let tmp = TempDir::new().unwrap();
    let report = CorpusLoader::new(tmp.path()).load().expect("load");
    assert!(report.documents.is_empty());
    assert_eq!(report.files_seen(), 0);
}
