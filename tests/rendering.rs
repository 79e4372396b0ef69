use car_sales_report::builder::{generate, RenderError, ReportBuilder};
use car_sales_report::model::Report;
use car_sales_report::table::TABLE_HEADER;
use sha2::{Digest, Sha256};

fn sample_table() -> Vec<Vec<String>> {
    let mut rows = vec![TABLE_HEADER.iter().map(|title| title.to_string()).collect()];
    for id in 1..=40 {
        rows.push(vec![
            id.to_string(),
            format!("Make {} Model (20{:02})", id, id % 20),
            format!("${}.99", id * 1000),
            (id * 7).to_string(),
        ]);
    }
    rows
}

fn sample_report() -> Report {
    Report::summary(
        "Sales summary for last month",
        "The <b>Make 40 Model (2000)</b> generated the most revenue<br/>Second line",
        sample_table(),
    )
    .expect("valid markup")
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    match ReportBuilder::new().with_page_numbers().render(&sample_report()) {
        Ok(pdf) => Some(pdf.bytes),
        Err(RenderError::FontLoad(err)) => {
            eprintln!(
                "Skipping rendering assertions: {}. Set CAR_SALES_FONTS_DIR to a Liberation Sans directory.",
                err
            );
            None
        }
        Err(other) => panic!("render sample pdf: {other}"),
    }
}

const VOLATILE_SEGMENTS: &[(&str, &str)] = &[
    ("/CreationDate(", ")"),
    ("/ModDate(", ")"),
    ("/ID[", "]"),
    ("/Producer(", ")"),
    ("<xmp:CreateDate>", "</xmp:CreateDate>"),
    ("<xmp:ModifyDate>", "</xmp:ModifyDate>"),
    ("<xmp:MetadataDate>", "</xmp:MetadataDate>"),
    ("<xmpMM:DocumentID>", "</xmpMM:DocumentID>"),
    ("<xmpMM:InstanceID>", "</xmpMM:InstanceID>"),
    ("<xmpMM:VersionID>", "</xmpMM:VersionID>"),
];

/// Overwrites everything between `start` and `end` with `0`, for every occurrence.
fn blank_between(data: &mut [u8], start: &[u8], end: &[u8]) {
    let mut offset = 0;
    while let Some(found) = data[offset..]
        .windows(start.len())
        .position(|window| window == start)
    {
        let from = offset + found + start.len();
        let Some(len) = data[from..].windows(end.len()).position(|window| window == end) else {
            break;
        };
        for byte in &mut data[from..from + len] {
            if !byte.is_ascii_whitespace() && !matches!(*byte, b'<' | b'>') {
                *byte = b'0';
            }
        }
        offset = from + len + end.len();
    }
}

/// Hash of the PDF with timestamps and document ids blanked out.
fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let mut data = bytes.to_vec();
    for (start, end) in VOLATILE_SEGMENTS {
        blank_between(&mut data, start.as_bytes(), end.as_bytes());
    }
    Sha256::digest(&data).into()
}

#[test]
fn renders_pdf_document() {
    let Some(bytes) = render_sample_pdf() else {
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_sample_pdf() else {
        return;
    };
    let Some(bytes_b) = render_sample_pdf() else {
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn generate_writes_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cars.pdf");

    match generate(&path, "Sales", "one<br/>two", sample_table()) {
        Ok(pdf) => assert_eq!(std::fs::read(&path).expect("file written"), pdf.bytes),
        Err(RenderError::FontLoad(_)) => {}
        Err(other) => panic!("generate failed: {other}"),
    }
}

#[test]
fn unwritable_path_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing-dir").join("cars.pdf");

    match generate(&path, "Sales", "body", sample_table()) {
        Err(RenderError::Io { path: reported, .. }) => assert_eq!(reported, path),
        Err(RenderError::FontLoad(_)) => {}
        other => panic!("expected an io error, got {:?}", other.map(|pdf| pdf.bytes.len())),
    }
}

#[test]
fn bad_markup_fails_before_fonts_are_needed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = generate(dir.path().join("cars.pdf"), "Sales", "<b>open", sample_table()).unwrap_err();
    assert!(matches!(err, RenderError::Markup(_)));
}
