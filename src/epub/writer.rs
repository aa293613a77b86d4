//! EPUB 3 packaging. The archive layout is fixed: `mimetype` first and
//! uncompressed, `META-INF/container.xml`, then the package documents and
//! resources under `OEBPS/`.

use crate::dom::serialize::xml_escape;
use crate::epub::{EpubBook, NavPoint};
use crate::util::format_iso8601;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write the book to an EPUB file with atomic rename.
pub fn write_epub(book: &EpubBook, path: &Path) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("epub.tmp");
    let file = std::fs::File::create(&tmp_path)?;
    let mut zip = ZipWriter::new(file);

    // mimetype must be the first entry and stored uncompressed.
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/epub+zip")?;

    let deflate = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("META-INF/container.xml", deflate)?;
    zip.write_all(generate_container_xml().as_bytes())?;

    let opf_dir = "OEBPS";

    let opf = generate_opf(book);
    zip.start_file(format!("{opf_dir}/content.opf"), deflate)?;
    zip.write_all(opf.as_bytes())?;

    let toc_xhtml = generate_toc_xhtml(&book.navigation.toc, &book.metadata.title);
    zip.start_file(format!("{opf_dir}/toc.xhtml"), deflate)?;
    zip.write_all(toc_xhtml.as_bytes())?;

    let toc_ncx = generate_toc_ncx(
        &book.navigation.toc,
        &book.metadata.title,
        book.metadata.identifier.as_deref().unwrap_or(""),
    );
    zip.start_file(format!("{opf_dir}/toc.ncx"), deflate)?;
    zip.write_all(toc_ncx.as_bytes())?;

    for (path_key, data) in &book.resources {
        zip.start_file(format!("{opf_dir}/{path_key}"), deflate)?;
        zip.write_all(data)?;
    }

    zip.finish()?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

fn generate_container_xml() -> String {
    r##"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"##
        .to_string()
}

fn generate_opf(book: &EpubBook) -> String {
    let mut opf = String::new();
    opf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    opf.push_str(
        "<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\" unique-identifier=\"uid\">\n",
    );

    opf.push_str("  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");

    match &book.metadata.identifier {
        Some(id) => opf.push_str(&format!(
            "    <dc:identifier id=\"uid\">{}</dc:identifier>\n",
            xml_escape(id)
        )),
        None => {
            let uuid = uuid::Uuid::new_v4();
            opf.push_str(&format!(
                "    <dc:identifier id=\"uid\">urn:uuid:{uuid}</dc:identifier>\n"
            ));
        }
    }

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        xml_escape(&book.metadata.title)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        xml_escape(&book.metadata.language)
    ));
    opf.push_str(&format!(
        "    <dc:creator>{}</dc:creator>\n",
        xml_escape(&book.metadata.creator)
    ));
    if let Some(ref publisher) = book.metadata.publisher {
        opf.push_str(&format!(
            "    <dc:publisher>{}</dc:publisher>\n",
            xml_escape(publisher)
        ));
    }
    if let Some(ref desc) = book.metadata.description {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            xml_escape(desc)
        ));
    }

    // dcterms:modified is required by EPUB 3.
    opf.push_str("    <meta property=\"dcterms:modified\">");
    match &book.metadata.modified {
        Some(modified) => opf.push_str(modified),
        None => opf.push_str(&format_iso8601()),
    }
    opf.push_str("</meta>\n");

    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str("    <item id=\"toc\" href=\"toc.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    for item in &book.manifest {
        let props = if let Some(ref p) = item.properties {
            format!(" properties=\"{p}\"")
        } else {
            String::new()
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{props}/>\n",
            xml_escape(&item.id),
            xml_escape(&item.href),
            xml_escape(&item.media_type)
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    for item in &book.spine {
        let linear = if item.linear { "" } else { " linear=\"no\"" };
        opf.push_str(&format!("    <itemref idref=\"{}\"{linear}/>\n", item.idref));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

fn generate_toc_xhtml(toc: &[NavPoint], title: &str) -> String {
    let mut html = String::new();
    html.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
    );
    html.push_str("<head>\n<title>");
    html.push_str(&xml_escape(title));
    html.push_str("</title>\n");
    html.push_str(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"styles/style.css\" />\n</head>\n",
    );
    html.push_str("<body>\n");
    html.push_str("<nav epub:type=\"toc\" class=\"table-of-contents\">\n");
    html.push_str("<h1>Table of Contents</h1>\n");
    if !toc.is_empty() {
        html.push_str("<ol>\n");
        for point in toc {
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                xml_escape(&point.href),
                xml_escape(&point.label)
            ));
        }
        html.push_str("</ol>\n");
    }
    html.push_str("</nav>\n</body>\n</html>\n");
    html
}

fn generate_toc_ncx(toc: &[NavPoint], title: &str, uid: &str) -> String {
    let mut ncx = String::new();
    ncx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    ncx.push_str("<ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\" version=\"2005-1\">\n");
    ncx.push_str("<head>\n");
    ncx.push_str(&format!(
        "  <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        xml_escape(uid)
    ));
    ncx.push_str("</head>\n");
    ncx.push_str(&format!(
        "<docTitle><text>{}</text></docTitle>\n",
        xml_escape(title)
    ));
    ncx.push_str("<navMap>\n");
    for (i, point) in toc.iter().enumerate() {
        let id = i + 1;
        ncx.push_str(&format!(
            "<navPoint id=\"navpoint-{id}\" playOrder=\"{id}\">\n"
        ));
        ncx.push_str(&format!(
            "  <navLabel><text>{}</text></navLabel>\n",
            xml_escape(&point.label)
        ));
        ncx.push_str(&format!(
            "  <content src=\"{}\"/>\n",
            xml_escape(&point.href)
        ));
        ncx.push_str("</navPoint>\n");
    }
    ncx.push_str("</navMap>\n");
    ncx.push_str("</ncx>\n");
    ncx
}
