use std::collections::HashSet;

use crate::common::{TestApp, decode_qr, routes, unzip, xlsx};

mod batch_upload {
    use super::*;

    #[tokio::test]
    async fn url_column_with_duplicates_yields_unique_items() {
        let app = TestApp::spawn().await;
        let bytes = xlsx(&[
            &["Name", "Website"],
            &["A", "a.com"],
            &["B", "https://b.com"],
            &["A again", "a.com"],
        ]);

        let res = app.upload("urls.xlsx", bytes).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();
        assert!(id.starts_with("batch_"));
        assert_eq!(id.len(), "batch_".len() + 8);

        let items = res.body["items"].as_array().unwrap();
        let urls: HashSet<_> = items.iter().map(|i| i["url"].as_str().unwrap()).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(urls, HashSet::from(["https://a.com", "https://b.com"]));
        assert_eq!(
            res.body["zip_url"],
            format!("/api/v1/qrcode/batch/{id}/download")
        );
        assert!(res.body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_rows_are_reported() {
        let app = TestApp::spawn().await;
        let bytes = xlsx(&[&["url"], &["good.com"], &["not a url"], &["also-good.org"]]);

        let res = app.upload("urls.xlsx", bytes).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["items"].as_array().unwrap().len(), 2);
        let errors = res.body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["row"], 2);
        assert_eq!(errors[0]["message"], "Row 2: Invalid URL - not a url");
    }

    #[tokio::test]
    async fn existing_qrcodes_are_reused_across_batches() {
        let app = TestApp::spawn().await;
        let single = app.create_qrcode("a.com").await;

        let res = app
            .upload("urls.xlsx", xlsx(&[&["link"], &["a.com"], &["c.com"]]))
            .await;

        assert_eq!(res.status, 201);
        let ids: Vec<_> = res.body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap().to_string())
            .collect();
        assert!(ids.contains(&single));
        assert_eq!(app.blobs.len(), 2);
    }

    #[tokio::test]
    async fn non_xlsx_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.upload("urls.csv", b"url\ngoogle.com\n".to_vec()).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Only .xlsx files are supported");
    }

    #[tokio::test]
    async fn corrupt_workbook_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.upload("urls.xlsx", b"definitely not a zip".to_vec()).await;
        assert_eq!(res.status, 400);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .starts_with("Error processing Excel file:"),
            "{}",
            res.text
        );
    }

    #[tokio::test]
    async fn workbook_without_urls_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("urls.xlsx", xlsx(&[&["url"], &["nope"], &["still nope"]]))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "No valid URLs found in Excel file");
    }
}

mod batch_read {
    use super::*;

    #[tokio::test]
    async fn get_batch_lists_members() {
        let app = TestApp::spawn().await;
        let created = app
            .upload("urls.xlsx", xlsx(&[&["url"], &["a.com"], &["b.com"]]))
            .await;
        let id = created.id();

        let res = app.get(&routes::batch(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["items"], created.body["items"]);
    }

    #[tokio::test]
    async fn unknown_batch_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::batch("batch_missing")).await;
        assert_eq!(res.status, 404);

        let res = app.get(&routes::batch_download("batch_missing")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Batch not found");
    }

    #[tokio::test]
    async fn archive_holds_one_png_per_member() {
        let app = TestApp::spawn().await;
        let created = app
            .upload(
                "urls.xlsx",
                xlsx(&[&["url"], &["a.com"], &["b.com"], &["c.com/path"]]),
            )
            .await;
        let id = created.id();

        let res = app.get_bytes(&routes::batch_download(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.content_type.as_deref(), Some("application/zip"));
        assert!(
            res.content_disposition
                .unwrap()
                .contains(&format!("{id}_qrcodes.zip"))
        );

        let entries = unzip(res.bytes);
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "qr_001_https_a.com.png",
                "qr_002_https_b.com.png",
                "qr_003_https_c.com_path.png",
            ]
        );

        for ((_, png), item) in entries.iter().zip(created.body["items"].as_array().unwrap()) {
            assert_eq!(decode_qr(png), item["url"].as_str().unwrap());
            let stored = app
                .get_bytes(&routes::qrcode_download(item["id"].as_str().unwrap()))
                .await;
            assert_eq!(&stored.bytes, png);
        }
    }
}
