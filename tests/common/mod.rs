#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use weekly_report_extract::Fragment;

/// One text run placed at an absolute position: (text, x, y).
pub type Placed<'a> = (&'a str, i64, i64);

pub fn create_report_pdf(
    path: &Path,
    pages: &[Vec<Placed<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for runs in pages {
        let mut operations = Vec::new();
        for (text, x, y) in runs {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 9.into()]),
                Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        (*x).into(),
                        (*y).into(),
                    ],
                ),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path)?;
    Ok(())
}

/// Landscape weekly report: the "Pct Of Total" column does not fit on page 1
/// and is printed on page 2 at the same heights as its rows.
pub fn two_page_report() -> Vec<Vec<Placed<'static>>> {
    vec![
        vec![
            ("Store 114 Fiscal Week", 50, 800),
            ("202547", 200, 800),
            ("Week To Date", 50, 770),
            ("Staff Member", 50, 740),
            ("Captured", 200, 740),
            ("Total", 300, 740),
            ("Pct O", 380, 740),
            ("Alice", 50, 720),
            ("Smith", 90, 720),
            ("12", 200, 720),
            ("30", 300, 720),
            ("Bob", 50, 700),
            ("8", 200, 700),
            ("20", 300, 700),
            ("Total", 50, 680),
            ("20", 200, 680),
            ("50", 300, 680),
        ],
        vec![
            ("Week To Date", 50, 770),
            ("Pct Of Total", 60, 740),
            ("40%", 60, 720),
            ("40%", 60, 700),
            ("40%", 60, 680),
            ("Month To Date", 50, 600),
            ("Staff Member", 50, 570),
            ("Captured", 200, 570),
            ("Carol", 50, 550),
            ("99", 200, 550),
        ],
    ]
}

pub fn to_fragments(pages: &[Vec<Placed<'_>>]) -> Vec<Fragment> {
    pages
        .iter()
        .zip(1_u32..)
        .flat_map(|(runs, page)| {
            runs.iter().map(move |(text, x, y)| {
                Fragment::new(*text, *x as f64, *y as f64, page)
            })
        })
        .collect()
}
