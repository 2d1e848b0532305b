use miette::{IntoDiagnostic, Result};
use nitf_isd::error::Error;
use nitf_isd::tre::TreRecord;
use nitf_isd::version::SegmentKind;
use nitf_isd::write::{ImageSegment, NitfWriter, WriterOptions};
use nitf_isd::{parse_bytes, parse_file, NitfVersion, ParseOptions};
use pretty_assertions::assert_eq;
use tracing::{info, instrument};
use tracing_test::traced_test;

#[instrument(skip(writer))]
fn write_and_read(writer: &NitfWriter, version: NitfVersion) -> Result<nitf_isd::IsdFile> {
    let mut file = tempfile::NamedTempFile::new().into_diagnostic()?;
    writer.write_to(file.as_file_mut())?;
    info!("wrote {}", file.path().display());

    let isd = parse_file(file.path(), &ParseOptions::default())?;
    assert_eq!(isd.version(), version);
    assert_eq!(isd.warnings(), &[]);
    Ok(isd)
}

#[traced_test]
#[test]
fn downgraded_20_file() -> Result<()> {
    let mut writer = NitfWriter::new(
        WriterOptions::builder()
            .version(NitfVersion::V20)
            .downgrade_event(true)
            .build(),
    );
    writer.add_image(
        &ImageSegment::builder()
            .downgrade_event(true)
            .coordinates("N".repeat(60))
            .comments(vec!["first".to_owned(), "second".to_owned()])
            .compression(*b"C3")
            .bands(vec![vec![vec![1, 2, 3], vec![4, 5, 6]], Vec::new()])
            .tres(vec![TreRecord::new(*b"BLOCKA", "b".repeat(20)).into_diagnostic()?])
            .data(vec![0xFF; 100])
            .build(),
    )?;

    let isd = write_and_read(&writer, NitfVersion::V20)?;

    let header = isd.header_fields()?;
    assert_eq!(header.value("FSDWNG"), Some("999998"));
    assert_eq!(header.get("FL").map(|f| f.offset), Some(382));

    let image = isd.image_fields(0)?.unwrap_or_default();
    assert_eq!(image.value("ISDWNG"), Some("999998"));
    assert_eq!(image.value("ICOM2"), Some("second"));
    assert_eq!(image.value("NLUTS1"), Some("2"));
    assert_eq!(image.value("NLUTS2"), Some("0"));
    assert_eq!(image.get("ICORDS").map(|f| f.offset), Some(isd.header_length() + 411));

    assert_eq!(isd.images()[0].tres()[0].tag(), "BLOCKA");
    assert_eq!(isd.images()[0].data_length(), 100);

    Ok(())
}

#[test]
fn other_segments_move_the_des() -> Result<()> {
    let mut writer = NitfWriter::new(WriterOptions::builder().version(NitfVersion::V20).build());
    writer.add_image(&ImageSegment::builder().data(vec![1; 12]).build())?;
    writer.add_segment(SegmentKind::Graphic, b"SY".to_vec(), vec![2; 30]);
    writer.add_segment(SegmentKind::Label, b"LA".to_vec(), vec![3; 4]);
    writer.add_segment(SegmentKind::Text, b"TE".to_vec(), b"some text".to_vec());
    writer.add_des(b"DEFIRST".to_vec(), b"first".to_vec());
    writer.add_segment(SegmentKind::ReservedExtension, b"RE".to_vec(), vec![4; 8]);

    let isd = write_and_read(&writer, NitfVersion::V20)?;

    let before_des = isd.segments().total_where(SegmentKind::precedes_des);
    assert_eq!(isd.des_offset(), isd.header_length() + before_des);
    assert_eq!(before_des, isd.images()[0].subheader().len() + 12 + 32 + 6 + 11);

    assert_eq!(isd.des_records().len(), 1);
    assert_eq!(isd.des_records()[0].data(), b"first");
    assert_eq!(isd.segments().get(SegmentKind::ReservedExtension).len(), 1);

    Ok(())
}

#[test]
fn many_bands_use_xbands() -> Result<()> {
    let mut writer = NitfWriter::new(WriterOptions::builder().build());
    writer.add_image(&ImageSegment::builder().bands(vec![Vec::new(); 12]).build())?;

    let isd = parse_bytes(&writer.to_bytes()?, &ParseOptions::default())?;

    let image = isd.image_fields(0)?.unwrap_or_default();
    assert_eq!(image.value("NBANDS"), Some("0"));
    assert_eq!(image.value("XBANDS"), Some("00012"));
    assert_eq!(image.value("IREPBAND12"), Some("M"));

    Ok(())
}

#[test]
fn zero_bands_round_trip() -> Result<()> {
    for version in [NitfVersion::V20, NitfVersion::V21] {
        let mut writer = NitfWriter::new(WriterOptions::builder().version(version).build());
        writer.add_image(
            &ImageSegment::builder()
                .bands(Vec::new())
                .tres(vec![TreRecord::new(*b"TEST  ", "hello").into_diagnostic()?])
                .build(),
        )?;

        let isd = write_and_read(&writer, version)?;

        let image = isd.image_fields(0)?.unwrap_or_default();
        assert_eq!(image.value("NBANDS"), Some("0"));
        assert_eq!(image.contains_key("XBANDS"), version == NitfVersion::V21);
        assert!(!image.contains_key("IREPBAND1"));
        assert_eq!(isd.images()[0].tres()[0].payload(), b"hello");
    }

    Ok(())
}

#[test]
fn numx_value_does_not_move_segments() -> Result<()> {
    let mut writer = NitfWriter::new(WriterOptions::builder().build());
    writer.add_segment(SegmentKind::Graphic, b"SY".to_vec(), vec![2; 30]);
    writer.add_des(b"DEFIRST".to_vec(), b"first".to_vec());
    let mut file = writer.to_bytes()?;

    let numx = 360 + 3 + 3 + 10;
    assert_eq!(&file[numx..numx + 3], b"000");
    file[numx..numx + 3].copy_from_slice(b"001");

    let isd = parse_bytes(&file, &ParseOptions::default())?;

    assert_eq!(isd.warnings(), &[]);
    assert_eq!(isd.header_fields()?.value("NUMX"), Some("001"));
    assert!(isd.segments().get(SegmentKind::Label).is_empty());
    assert_eq!(isd.des_records()[0].data(), b"first");

    Ok(())
}

#[test]
fn too_many_comments() -> Result<()> {
    let segment = ImageSegment::builder()
        .comments(vec![String::new(); 10])
        .build();

    let err = NitfWriter::new(WriterOptions::builder().build())
        .add_image(&segment)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::FieldTooWide {
            value: 10,
            width: 1,
            ..
        }
    ));

    Ok(())
}
