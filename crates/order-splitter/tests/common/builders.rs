//! Builders for test inputs: orders PDFs, mapping sheets and configs.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{dictionary, Document, Object, Stream};

use order_splitter::config::{Config, OverwritePolicy};

/// Builds an orders PDF with one Courier text line per page.
pub struct PdfBuilder {
    pages: Vec<String>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// Add a page showing `text`.
    pub fn page(mut self, text: &str) -> Self {
        self.pages.push(text.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in &self.pages {
            let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("Failed to serialize test PDF");
        bytes
    }
}

/// Builds a mapping sheet as CSV or XLSX from the same rows.
pub struct SheetBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// The usual `SKU,Vendor,Email` layout.
    pub fn standard() -> Self {
        Self::new(&["SKU", "Vendor", "Email"])
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn to_csv(&self) -> Vec<u8> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .expect("Failed to write CSV header");
        for row in &self.rows {
            writer.write_record(row).expect("Failed to write CSV row");
        }
        writer.into_inner().expect("Failed to flush CSV")
    }

    /// Text cells go through the shared string table; values that parse as
    /// numbers are written as numeric cells, the way Excel stores SKUs typed
    /// as numbers.
    pub fn to_xlsx(&self) -> Vec<u8> {
        let mut shared: Vec<String> = Vec::new();
        let mut sheet_rows = String::new();

        for (r, row) in std::iter::once(&self.headers).chain(&self.rows).enumerate() {
            sheet_rows.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let reference = format!("{}{}", column_letter(c), r + 1);
                if r > 0 && !value.is_empty() && value.parse::<f64>().is_ok() {
                    sheet_rows.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value));
                } else if !value.is_empty() {
                    let index = match shared.iter().position(|s| s == value) {
                        Some(index) => index,
                        None => {
                            shared.push(value.clone());
                            shared.len() - 1
                        }
                    };
                    sheet_rows.push_str(&format!(
                        r#"<c r="{}" t="s"><v>{}</v></c>"#,
                        reference, index
                    ));
                }
            }
            sheet_rows.push_str("</row>");
        }

        let shared_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
            shared.len(),
            shared
                .iter()
                .map(|s| format!("<si><t>{}</t></si>", escape_xml(s)))
                .collect::<String>()
        );
        let sheet_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            sheet_rows
        );

        let parts = [
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Mapping" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            ("xl/sharedStrings.xml", shared_xml),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ];

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            for (name, body) in parts {
                zip.start_file(name, options).expect("Failed to start XLSX part");
                zip.write_all(body.as_bytes())
                    .expect("Failed to write XLSX part");
            }
            zip.finish().expect("Failed to finish XLSX");
        }
        buffer.into_inner()
    }
}

fn column_letter(index: usize) -> String {
    let mut index = index + 1;
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builder for `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn store_label(mut self, label: &str) -> Self {
        self.config.store_label = label.to_string();
        self
    }

    pub fn output_root(mut self, path: &str) -> Self {
        self.config.output_root = path.to_string();
        self
    }

    pub fn log_dir(mut self, path: &str) -> Self {
        self.config.log_dir = path.to_string();
        self
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.config.overwrite = policy;
        self
    }

    pub fn audit_lock_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.audit_lock_timeout_ms = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
