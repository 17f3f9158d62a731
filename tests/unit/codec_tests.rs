/*!
 * Tests for the subtitle codec across formats
 */

use lingosub::subtitle::tags::{dedupe_tags, line_tags, strip_tags};
use lingosub::subtitle::{self, SubtitleBlock, SubtitleFormat, Timestamp};
use lingosub::SubtitleError;

use crate::common::{SAMPLE_ASS, SAMPLE_SRT};

/// Test SRT to WebVTT conversion keeps text and renders alignment
#[test]
fn test_convert_srtToVtt_shouldRenderHeaderAndSpans() {
    let out = subtitle::convert(SAMPLE_SRT, SubtitleFormat::Srt, SubtitleFormat::WebVtt).unwrap();

    assert!(out.starts_with("WEBVTT\n\n1\n00:00:01.000 --> 00:00:04.000\nThis is a test subtitle."));
    assert!(out.contains("It contains <i>multiple</i> entries."));
    assert!(out.contains("vertical-align:top;"));
    assert!(out.contains("For testing purposes.</span>"));
    assert!(!out.contains("{\\an8}"));
}

/// Test SRT to ASS conversion uses default sections and keeps line tags
#[test]
fn test_convert_srtToAss_shouldWriteDialogueLines() {
    let out = subtitle::convert(SAMPLE_SRT, SubtitleFormat::Srt, SubtitleFormat::Ass).unwrap();

    assert!(out.starts_with("[Script Info]"));
    assert!(out.contains("[Events]"));
    assert!(out.contains("Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,This is a test subtitle."));
    assert!(out.contains("Dialogue: 0,0:00:10.00,0:00:14.00,Default,,0,0,0,,{\\an8}For testing purposes."));
}

/// Test ASS documents keep their sections, styles and positioning through a round trip
#[test]
fn test_parse_ass_thenSerialize_shouldPreserveSectionsAndTags() {
    let document = subtitle::parse(SAMPLE_ASS, SubtitleFormat::Ass).unwrap();
    assert_eq!(document.blocks().len(), 2);
    assert_eq!(document.blocks()[0].style, "Sign");
    assert_eq!(document.blocks()[0].line_tags, vec!["{\\pos(320,50)}".to_string()]);
    assert_eq!(document.blocks()[1].text, "Second line\nwith a break");

    let out = subtitle::serialize_document(&document, SubtitleFormat::Ass);
    assert!(out.starts_with("[Script Info]\nTitle: Sample"));
    assert!(out.contains("Style: Sign,Arial,20"));
    assert!(out.contains("Dialogue: 0,0:00:01.00,0:00:03.50,Sign,,0,0,0,,{\\pos(320,50)}Hello, world"));
    assert!(out.contains(",,Second line\\Nwith a break"));
}

/// Test ASS to SRT drops web-only positioning and expands breaks
#[test]
fn test_convert_assToSrt_shouldDropPositionTags() {
    let out = subtitle::convert(SAMPLE_ASS, SubtitleFormat::Ass, SubtitleFormat::Srt).unwrap();

    assert!(out.starts_with("1\n00:00:01,000 --> 00:00:03,500\nHello, world\n"));
    assert!(out.ends_with("2\n00:00:04,000 --> 00:00:06,000\nSecond line\nwith a break"));
    assert!(!out.contains("pos("));
}

/// Test frame based output at the default rate
#[test]
fn test_convert_srtToMicroDvd_shouldUseFrames() {
    let out = subtitle::convert(SAMPLE_SRT, SubtitleFormat::Srt, SubtitleFormat::MicroDvd).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "{24}{96}This is a test subtitle.");
    assert_eq!(lines[2], "{240}{336}For testing purposes.");
}

/// Test TTML output parses back with the same timing
#[test]
fn test_convert_srtToTtml_thenParse_shouldKeepTiming() {
    let out = subtitle::convert(SAMPLE_SRT, SubtitleFormat::Srt, SubtitleFormat::Ttml).unwrap();
    assert!(out.contains("<p begin=\"00:00:01.000\" end=\"00:00:04.000\">This is a test subtitle.</p>"));

    let document = subtitle::parse(&out, SubtitleFormat::Ttml).unwrap();
    let blocks = document.blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].text, "This is a test subtitle.");
    assert_eq!(blocks[2].start, "00:00:10.000");
    assert_eq!(blocks[2].end, "00:00:14.000");
}

/// Test SAMI output closes gaps and parses back into the same cues
#[test]
fn test_convert_srtToSami_thenParse_shouldRestoreEnds() {
    let out = subtitle::convert(SAMPLE_SRT, SubtitleFormat::Srt, SubtitleFormat::Sami).unwrap();
    assert!(out.contains("<SYNC Start=1000><P Class=ENCC>This is a test subtitle.</P></SYNC>"));
    assert!(out.contains("<SYNC Start=4000><P Class=ENCC>&nbsp;</P></SYNC>"));

    let document = subtitle::parse(&out, SubtitleFormat::Sami).unwrap();
    let blocks = document.blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].start, "00:00:01,000");
    assert_eq!(blocks[0].end, "00:00:04,000");
    assert_eq!(blocks[2].end, "00:00:14,000");
}

/// Test the last SAMI cue gets the fixed trailing duration
#[test]
fn test_parse_sami_withoutClosingSync_shouldUseTerminalDuration() {
    let text = "<SAMI><BODY><SYNC Start=2000><P>Only cue</P></BODY></SAMI>";
    let document = subtitle::parse(text, SubtitleFormat::Sami).unwrap();

    assert_eq!(document.blocks().len(), 1);
    assert_eq!(document.blocks()[0].end, "00:00:05,000");
}

/// Test every format drops blocks with broken timing instead of failing
#[test]
fn test_serialize_withInvalidTiming_shouldSkipInEveryFormat() {
    let blocks = vec![
        SubtitleBlock::new(1, "soon", "later", "Broken"),
        SubtitleBlock::new(2, "00:00:02,000", "00:00:03,000", "Valid"),
    ];

    for format in SubtitleFormat::all() {
        let out = subtitle::serialize(&blocks, *format, &Default::default());
        assert!(!out.contains("Broken"), "{} kept an invalid block", format);
        assert!(out.contains("Valid"), "{} lost a valid block", format);
    }
}

/// Test timestamps too large for the timeline drop their block
#[test]
fn test_serialize_document_withOverflowingTimestamp_shouldDropBlock() {
    let text = "1\n99999999999999:00:00,000 --> 99999999999999:00:01,000\nHi\n\n2\n00:00:02,000 --> 00:00:03,000\nValid\n";
    let document = subtitle::parse(text, SubtitleFormat::Srt).unwrap();

    let out = subtitle::serialize_document(&document, SubtitleFormat::Srt);
    assert_eq!(out, "2\n00:00:02,000 --> 00:00:03,000\nValid");
}

/// Test a SAMI cue at the very end of the timeline still parses and renders
#[test]
fn test_parse_sami_withMaximalStart_shouldNotOverflow() {
    let text = "<SAMI><BODY><SYNC Start=18446744073709551615><P>Hi</P></BODY></SAMI>";
    let document = subtitle::parse(text, SubtitleFormat::Sami).unwrap();

    assert_eq!(document.blocks().len(), 1);
    assert_eq!(document.blocks()[0].end, Timestamp::from_millis(u64::MAX).to_srt());
    assert!(subtitle::serialize_document(&document, SubtitleFormat::Srt).contains("Hi"));
}

/// Test parse errors for malformed input
#[test]
fn test_parse_withMalformedInput_shouldReturnErrors() {
    assert_eq!(
        subtitle::parse("1\n00:00:01.000 --> 00:00:02.000\nHi", SubtitleFormat::WebVtt),
        Err(SubtitleError::MissingWebVttHeader)
    );
    assert!(matches!(
        subtitle::parse("<tt><body>", SubtitleFormat::Ttml),
        Err(SubtitleError::Malformed { .. })
    ));
    assert!(matches!(
        subtitle::parse_with_hint(SAMPLE_SRT, "txt"),
        Err(SubtitleError::UnsupportedFormat(_))
    ));
}

/// Test the extension hint selects the grammar
#[test]
fn test_parse_with_hint_shouldResolveExtensions() {
    let document = subtitle::parse_with_hint(SAMPLE_SRT, ".SRT").unwrap();
    assert_eq!(document.blocks().len(), 3);
    assert_eq!(SubtitleFormat::from_extension("dfxp").unwrap(), SubtitleFormat::Ttml);
    assert_eq!(SubtitleFormat::from_path("movie.en.smi").unwrap(), SubtitleFormat::Sami);
}

/// Test timestamp spellings accepted by the grammar
#[test]
fn test_timestamp_parse_shouldAcceptEverySeparator() {
    let expected = Timestamp::from_millis(3_723_450);
    assert_eq!(Timestamp::parse("01:02:03,450").unwrap(), expected);
    assert_eq!(Timestamp::parse("01:02:03.450").unwrap(), expected);
    assert_eq!(Timestamp::parse("1:02:03.45").unwrap(), expected);
    assert_eq!(Timestamp::parse("62:03:450").unwrap(), expected);

    assert!(!Timestamp::is_valid("1:2:3"));
    assert!(!Timestamp::is_valid("00:00:01,4"));
    assert_eq!(expected.to_ass(), "1:02:03.45");
}

/// Test tag helpers on a line mixing every kind of override
#[test]
fn test_tag_helpers_withMixedLine_shouldAgree() {
    let text = r"{\an8}{\pos(1,2)}{\b1}Bold{\b1} and {\b0}plain{\pos(3,4)}\Nnext";

    assert_eq!(line_tags(text), vec![r"{\an8}".to_string(), r"{\pos(1,2)}".to_string()]);
    assert_eq!(dedupe_tags(text), r"{\an8}{\pos(1,2)}{\b1}Bold and {\b0}plain\Nnext");
    assert_eq!(strip_tags(text), "Bold and plain\nnext");
}
