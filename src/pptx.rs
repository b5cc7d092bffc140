// ABOUTME: PPTX writer for generated decks
// ABOUTME: Packages slide titles, bullets and resolved images into an in-memory presentation

use crate::deck::{Deck, DeckStyle, Slide};
use crate::errors::{DeckError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::{write::FileOptions, ZipWriter};

pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const DEFAULT_FILENAME: &str = "AI-deck.pptx";

const EMU_PER_INCH: f64 = 914_400.0;

/// 16:9 slide size in EMU (10in x 5.625in).
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 5_143_500;

/// Configuration for PPTX generation
pub struct PptxConfig {
    pub title: String,
    pub style: DeckStyle,
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            style: DeckStyle::Professional,
        }
    }
}

impl PptxConfig {
    pub fn for_deck(deck: &Deck) -> Self {
        Self {
            title: deck.topic.clone(),
            style: deck.style,
        }
    }
}

/// An image ready to embed: file extension plus raw bytes.
struct EmbeddedImage {
    ext: &'static str,
    bytes: Vec<u8>,
}

/// Decode a `data:image/...;base64,` URL into embeddable bytes.
fn decode_data_url(data_url: &str) -> Option<EmbeddedImage> {
    let (meta, payload) = data_url.strip_prefix("data:")?.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let ext = match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/gif" => "gif",
        _ => return None,
    };
    let bytes = BASE64.decode(payload.trim()).ok()?;
    Some(EmbeddedImage { ext, bytes })
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

fn font_for(style: DeckStyle) -> &'static str {
    match style {
        DeckStyle::Professional => "Calibri",
        DeckStyle::Casual => "Trebuchet MS",
    }
}

fn text_run(text: &str, size: u32, bold: bool, font: &str) -> String {
    format!(
        r#"<a:r><a:rPr lang="en-US" sz="{size}"{bold}><a:latin typeface="{font}"/></a:rPr><a:t>{text}</a:t></a:r>"#,
        size = size,
        bold = if bold { r#" b="1""# } else { "" },
        font = font,
        text = escape(text),
    )
}

fn text_shape(id: u32, name: &str, frame: (f64, f64, f64, f64), paragraphs: &str) -> String {
    let (x, y, w, h) = frame;
    format!(
        r#"            <p:sp>
                <p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
                <p:spPr>
                    <a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{w}" cy="{h}"/></a:xfrm>
                    <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
                </p:spPr>
                <p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody>
            </p:sp>
"#,
        id = id,
        name = name,
        x = emu(x),
        y = emu(y),
        w = emu(w),
        h = emu(h),
        paragraphs = paragraphs,
    )
}

fn picture(frame: (f64, f64, f64, f64)) -> String {
    let (x, y, w, h) = frame;
    format!(
        r#"            <p:pic>
                <p:nvPicPr><p:cNvPr id="4" name="Image"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>
                <p:blipFill><a:blip r:embed="rId1"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
                <p:spPr>
                    <a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{w}" cy="{h}"/></a:xfrm>
                    <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
                </p:spPr>
            </p:pic>
"#,
        x = emu(x),
        y = emu(y),
        w = emu(w),
        h = emu(h),
    )
}

fn slide_xml(slide: &Slide, has_image: bool, font: &str) -> String {
    let title = format!("<a:p>{}</a:p>", text_run(&slide.title, 2800, true, font));
    let bullets: String = slide
        .bullets
        .iter()
        .map(|b| {
            format!(
                r#"<a:p><a:pPr marL="285750" indent="-285750"><a:buChar char="&#8226;"/></a:pPr>{}</a:p>"#,
                text_run(b, 1800, false, font)
            )
        })
        .collect();
    // Text spans the full width when there is no picture beside it.
    let body_width = if has_image { 5.4 } else { 9.0 };

    let mut tree = String::new();
    tree.push_str(&text_shape(2, "Title", (0.5, 0.4, 9.0, 0.8), &title));
    tree.push_str(&text_shape(3, "Body", (0.5, 1.3, body_width, 3.9), &bullets));
    if has_image {
        tree.push_str(&picture((6.1, 1.3, 3.5, 3.9)));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm>
            </p:grpSpPr>
{tree}        </p:spTree>
    </p:cSld>
    <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
        tree = tree
    )
}

/// Render `deck` into PPTX bytes.
pub fn write_pptx(deck: &Deck, config: &PptxConfig) -> Result<Vec<u8>> {
    if deck.slides.is_empty() {
        return Err(DeckError::ValidationError("Deck.slides is empty".to_string()));
    }
    info!("Writing PPTX with {} slides", deck.slides.len());

    let font = font_for(config.style);
    let options = FileOptions::default();

    let images: Vec<Option<EmbeddedImage>> = deck
        .slides
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let data = s.image_data.as_deref()?;
            let decoded = decode_data_url(data);
            if decoded.is_none() {
                warn!("Slide {} has undecodable image data; skipping image", i + 1);
            }
            decoded
        })
        .collect();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", options)?;
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="jpeg" ContentType="image/jpeg"/>
    <Default Extension="png" ContentType="image/png"/>
    <Default Extension="gif" ContentType="image/gif"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    {slides}
</Types>"#,
        slides = (1..=deck.slides.len())
            .map(|n| format!(r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#, n))
            .collect::<Vec<String>>()
            .join("\n    ")
    );
    zip.write_all(content_types.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("docProps/app.xml", options)?;
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>deck-forge</Application>
    <Slides>{}</Slides>
</Properties>"#,
        deck.slides.len()
    );
    zip.write_all(app_xml.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dc:creator>deck-forge</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        escape(config.title.as_str()),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    zip.write_all(core_xml.as_bytes())?;

    zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
    let mut pres_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for n in 1..=deck.slides.len() {
        pres_rels.push_str(&format!(
            r#"    <Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{n}.xml"/>"#,
            n = n
        ));
        pres_rels.push('\n');
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    zip.start_file("ppt/presentation.xml", options)?;
    let presentation_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        slide_ids = (0..deck.slides.len())
            .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect::<Vec<String>>()
            .join("\n"),
        cx = SLIDE_CX,
        cy = SLIDE_CY
    );
    zip.write_all(presentation_xml.as_bytes())?;

    for (i, (slide, image)) in deck.slides.iter().zip(&images).enumerate() {
        let slide_num = i + 1;

        let mut slide_rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
        );
        if let Some(image) = image {
            let image_name = format!("image{}.{}", slide_num, image.ext);
            zip.start_file(format!("ppt/media/{}", image_name), options)?;
            zip.write_all(&image.bytes)?;
            slide_rels.push_str(&format!(
                r#"    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>"#,
                image_name
            ));
            slide_rels.push('\n');
        }
        slide_rels.push_str("</Relationships>");

        zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", slide_num), options)?;
        zip.write_all(slide_rels.as_bytes())?;

        zip.start_file(format!("ppt/slides/slide{}.xml", slide_num), options)?;
        zip.write_all(slide_xml(slide, image.is_some(), font).as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
