use std::io::Write;
use std::path::{Path, PathBuf};

use nitf_isd::error::{Error, ErrorKind, Result, Warning};
use nitf_isd::tre::TreRecord;
use nitf_isd::version::SegmentKind;
use nitf_isd::write::{ImageSegment, NitfWriter, WriterOptions};
use nitf_isd::{parse_bytes, parse_file, ImageSelection, Isd, NitfVersion, ParseOptions};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

fn resource(name: &str) -> PathBuf {
    PathBuf::from(format!("{}/resources/{name}", env!("CARGO_MANIFEST_DIR")))
}

fn validate_nitf(path: &Path) -> Result<()> {
    info!("testing {}", path.display());

    let size = std::fs::metadata(path)?.len();
    let isd = parse_file(path, &ParseOptions::default())?;

    assert_eq!(isd.warnings(), &[]);
    assert_eq!(isd.file_length(), size);
    assert_eq!(isd.file_header().len(), isd.header_length());
    assert_eq!(
        isd.header_length() + isd.segments().total_where(|_| true),
        size as usize
    );
    assert_eq!(isd.images().len(), isd.segments().get(SegmentKind::Image).len());
    assert_eq!(
        isd.des_records().len(),
        isd.segments().get(SegmentKind::DataExtension).len()
    );

    let fields = isd.header_fields()?;
    assert_eq!(fields.value("FL"), Some(format!("{size:012}").as_str()));

    Ok(())
}

#[traced_test]
#[test]
fn validate_nitf_parsing() -> Result<()> {
    let to_test = std::fs::read_dir(format!("{}/resources/", env!("CARGO_MANIFEST_DIR")))?
        .filter_map(|res| res.ok())
        .map(|dir_entry| dir_entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "ntf"));

    let mut tested = 0;
    for path in to_test {
        validate_nitf(&path)?;
        tested += 1;
    }
    assert!(tested > 0);

    Ok(())
}

#[test]
fn one_image_21() -> Result<()> {
    let isd = parse_file(resource("one_image_21.ntf"), &ParseOptions::default())?;

    assert_eq!(isd.version(), NitfVersion::V21);
    assert_eq!(isd.format_tag(), "NITF2.1");
    assert_eq!(isd.header_length(), 434);
    assert_eq!(isd.des_offset(), 434 + 458 + 16);

    assert_eq!(isd.file_tres(), &[TreRecord::new(*b"FILETR", "abc")?]);

    let image = &isd.images()[0];
    assert_eq!(image.offset(), 434);
    assert_eq!(image.subheader().len(), 458);
    assert_eq!(image.tres(), &[TreRecord::new(*b"TEST  ", "hello")?]);

    let des = &isd.des_records()[0];
    assert_eq!(des.type_id(), "XML_DATA_CONTENT");
    assert!(des.data().starts_with(b"<SICD"));

    let header = isd.header_fields()?;
    assert_eq!(header.value("LISH001"), Some("000458"));
    assert_eq!(header.value("NUMX"), Some("000"));

    let fields = isd.image_fields(0)?.unwrap_or_default();
    assert_eq!(fields.value("IID1"), Some("IMAGE0001"));
    assert_eq!(fields.get("ICORDS").map(|f| f.offset), Some(434 + 371));
    assert!(!fields.contains_key("IGEOLO"));
    assert!(isd.image_fields(1)?.is_none());

    Ok(())
}

#[test]
fn downgrade_20() -> Result<()> {
    let isd = parse_file(resource("downgrade_20.ntf"), &ParseOptions::default())?;

    assert_eq!(isd.format_tag(), "NITF2.0");
    assert!(isd.file_tres().is_empty());
    assert_eq!(isd.segments().get(SegmentKind::Text).len(), 1);
    assert_eq!(isd.des_offset(), isd.file_length() as usize);

    let tags: Vec<_> = isd.images()[0]
        .tres()
        .iter()
        .map(|tre| (tre.tag().into_owned(), tre.length()))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("ACFTA ".to_owned(), 10),
            ("BLOCKA".to_owned(), 20),
            ("STDIDB".to_owned(), 30),
        ]
    );

    let header = isd.header_fields()?;
    assert_eq!(header.value("FSDEVT"), Some("FILE DOWNGRADE"));
    assert_eq!(header.get("FL").map(|f| f.offset), Some(382));

    let fields = isd.image_fields(0)?.unwrap_or_default();
    assert_eq!(fields.value("ISDEVT"), Some("DOWNGRADE EVENT"));
    assert_eq!(fields.value("ICOM1"), Some("a single comment"));
    assert_eq!(fields.value("COMRAT"), Some("1.50"));
    assert_eq!(fields.value("NELUT1"), Some("00004"));

    Ok(())
}

#[test]
fn minimal_21_end_to_end() -> Result<()> {
    let mut writer = NitfWriter::new(WriterOptions::builder().build());
    writer.add_image(
        &ImageSegment::builder()
            .tres(vec![TreRecord::new(*b"TEST  ", "hello")?])
            .data(vec![7u8; 32])
            .build(),
    )?;
    let file = writer.to_bytes()?;

    let isd = parse_bytes(&file, &ParseOptions::default())?;

    assert_eq!(isd.format_tag(), "NITF2.1");
    assert_eq!(isd.file_length(), file.len() as u64);
    assert_eq!(
        isd.header_length() + isd.segments().total_where(|_| true),
        file.len()
    );
    assert_eq!(isd.images().len(), 1);

    let tre = &isd.images()[0].tres()[0];
    assert_eq!((&*tre.tag(), tre.length(), tre.payload()), ("TEST  ", 5, b"hello".as_slice()));

    assert!(isd.des_records().is_empty());
    assert!(isd.warnings().is_empty());

    Ok(())
}

fn three_images() -> Result<Vec<u8>> {
    let mut writer = NitfWriter::new(WriterOptions::builder().build());
    for (n, size) in [(0u8, 10usize), (1, 0), (2, 25)] {
        writer.add_image(
            &ImageSegment::builder()
                .tres(vec![TreRecord::new(*b"INDEX ", vec![b'0' + n])?])
                .comments(vec!["x".repeat(usize::from(n))])
                .data(vec![n; size])
                .build(),
        )?;
    }
    writer.add_des(b"DE".to_vec(), b"after the images".to_vec());
    writer.to_bytes()
}

#[test]
fn image_selection() -> Result<()> {
    let file = three_images()?;
    let all = parse_bytes(&file, &ParseOptions::default())?;
    assert_eq!(all.images().len(), 3);

    for k in 0..3 {
        let options = ParseOptions::builder()
            .selection(ImageSelection::Index(k))
            .build();
        let selected = parse_bytes(&file, &options)?;

        assert_eq!(selected.images(), &all.images()[k..=k]);
        assert_eq!(selected.images()[0].tres()[0].payload(), &[b'0' + k as u8]);
        assert_eq!(selected.des_offset(), all.des_offset());
        assert_eq!(selected.des_records(), all.des_records());
    }

    let options = ParseOptions::builder()
        .selection(ImageSelection::from_raw(3))
        .build();
    let none = parse_bytes(&file, &options)?;
    assert!(none.images().is_empty());
    assert_eq!(none.des_records()[0].data(), b"after the images");

    Ok(())
}

#[test]
fn parsing_is_idempotent() -> Result<()> {
    let file = three_images()?;

    let first = parse_bytes(&file, &ParseOptions::default())?;
    let second = parse_bytes(&file, &ParseOptions::default())?;

    assert_eq!(first, second);

    Ok(())
}

#[test]
fn file_length_larger_than_file_warns() -> Result<()> {
    let mut file = std::fs::read(resource("one_image_21.ntf"))?;
    let actual = file.len() as u64;
    file[342..354].copy_from_slice(format!("{:012}", actual + 500).as_bytes());

    let isd = parse_bytes(&file, &ParseOptions::default())?;

    assert_eq!(
        isd.warnings(),
        &[
            Warning::FileLengthMismatch {
                declared: actual + 500,
                actual,
            },
            Warning::SegmentLengthMismatch {
                declared: actual + 500,
                segments_end: actual,
            },
        ]
    );
    assert_eq!(isd.images().len(), 1);
    assert_eq!(isd.des_records().len(), 1);

    Ok(())
}

#[test]
fn truncated_des_keeps_earlier_records() -> Result<()> {
    let mut writer = NitfWriter::new(WriterOptions::builder().build());
    writer.add_des(b"DEFIRST".to_vec(), vec![b'1'; 40]);
    writer.add_des(b"DESECOND".to_vec(), vec![b'2'; 40]);
    let mut file = writer.to_bytes()?;
    file.truncate(file.len() - 10);

    let err = parse_bytes(&file, &ParseOptions::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Truncated);
    assert_eq!(err.recovered_des().len(), 1);
    assert_eq!(err.recovered_des()[0].header(), b"DEFIRST");
    assert!(matches!(err, Error::TruncatedDes { index: 1, needed: 48, available: 38, .. }));

    Ok(())
}

#[test]
fn header_length_mismatch_is_fatal() -> Result<()> {
    let mut file = std::fs::read(resource("one_image_21.ntf"))?;
    file[354..360].copy_from_slice(b"000430");

    let err = parse_bytes(&file, &ParseOptions::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
    assert!(matches!(
        err,
        Error::HeaderLengthMismatch {
            declared: 430,
            parsed: 434
        }
    ));

    Ok(())
}

#[test]
fn file_tres_round_trip() -> Result<()> {
    for count in 0..4 {
        let tres: Vec<_> = (0..count)
            .map(|n| TreRecord::new(*b"ROUND ", "r".repeat(n * 7)))
            .collect::<Result<_>>()?;

        let options = WriterOptions::builder().version(NitfVersion::V20).build();
        let mut writer = NitfWriter::new(options);
        for tre in &tres {
            writer.add_file_tre(tre.clone());
        }
        let isd = parse_bytes(&writer.to_bytes()?, &ParseOptions::default())?;

        assert_eq!(isd.file_tres(), tres.as_slice());
    }

    Ok(())
}

#[test]
fn forced_version_mismatch_warns() -> Result<()> {
    let mut patched = std::fs::read(resource("one_image_21.ntf"))?;
    patched[..9].copy_from_slice(b"NITF02.11");

    let options = ParseOptions::builder().version(NitfVersion::V21).build();
    let isd = parse_bytes(&patched, &options)?;

    assert_eq!(
        isd.warnings(),
        &[Warning::SignatureMismatch {
            expected: "NITF2.1",
            found: "NITF02.11".to_owned(),
        }]
    );

    let err = parse_bytes(&patched, &ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

    Ok(())
}

#[test]
fn isd_envelope_formats() -> Result<()> {
    let nitf = Isd::from_path(resource("downgrade_20.ntf"), &ParseOptions::default())?;
    assert_eq!(nitf.format(), "NITF2.0");
    assert!(nitf.nitf().is_some());

    let mut other = tempfile::NamedTempFile::new()?;
    other.write_all(b"not a nitf file at all")?;
    let fallback = Isd::from_path(other.path(), &ParseOptions::default())?;
    assert_eq!(fallback, Isd::Filename(other.path().to_path_buf()));
    assert_eq!(fallback.format(), "FILENAME");

    assert_eq!(Isd::ByteStream(vec![1, 2, 3]).format(), "BYTESTREAM");

    Ok(())
}

#[traced_test]
#[test]
fn trace_fields_logs_every_field() -> Result<()> {
    let options = ParseOptions::builder().trace_fields(true).build();
    parse_file(resource("one_image_21.ntf"), &options)?;

    assert!(logs_contain("FHDR = NITF"));
    assert!(logs_contain("LISH001 = 000458"));
    assert!(logs_contain("NLUTS1 = 0"));

    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn serialize_to_json() -> Result<()> {
    let isd = parse_file(resource("one_image_21.ntf"), &ParseOptions::default())?;

    let value = serde_json::to_value(&isd).unwrap_or_default();

    assert_eq!(value["format"], "NITF2.1");
    assert_eq!(value["images"][0]["tres"][0]["payload"], "hello");
    assert_eq!(value["des_records"][0]["type_id"], "XML_DATA_CONTENT");
    assert_eq!(value["warnings"], serde_json::json!([]));

    Ok(())
}
