use crate::common::{TestApp, decode_qr, routes};

mod qrcode_create {
    use super::*;

    #[tokio::test]
    async fn bare_domain_is_normalized_to_https() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::QRCODE, &serde_json::json!({ "url": "google.com" }))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["id"], "qrcode_99999ebcfd");
        assert_eq!(res.body["url"], "https://google.com");
        assert_eq!(
            res.body["qr_image_url"],
            "/api/v1/qrcode/qrcode_99999ebcfd/image"
        );
        assert_eq!(
            res.body["download_url"],
            "/api/v1/qrcode/qrcode_99999ebcfd/download"
        );
        assert!(res.body["created_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn repeated_create_returns_same_record() {
        let app = TestApp::spawn().await;

        let first = app
            .post_json(routes::QRCODE, &serde_json::json!({ "url": "google.com" }))
            .await;
        let second = app
            .post_json(
                routes::QRCODE,
                &serde_json::json!({ "url": "  https://google.com " }),
            )
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_eq!(first.body, second.body);
        assert_eq!(app.blobs.len(), 1);
    }

    #[tokio::test]
    async fn explicit_scheme_is_kept() {
        let app = TestApp::spawn().await;
        let id = app.create_qrcode("http://example.com").await;
        assert_eq!(id, "qrcode_a9b9f04336");
    }

    #[tokio::test]
    async fn empty_or_missing_url_is_rejected() {
        let app = TestApp::spawn().await;

        for body in [
            serde_json::json!({ "url": "" }),
            serde_json::json!({ "url": "   " }),
            serde_json::json!({}),
        ] {
            let res = app.post_json(routes::QRCODE, &body).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
            assert_eq!(res.body["message"], "URL is required");
        }
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post_json(routes::QRCODE, &serde_json::json!({ "url": "not a url" }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app
            .post_json(routes::QRCODE, &serde_json::json!({ "url": 42 }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn links_use_public_base_url() {
        let app = TestApp::spawn_with_base_url(Some("https://qr.example.com")).await;
        let res = app
            .post_json(routes::QRCODE, &serde_json::json!({ "url": "google.com" }))
            .await;
        assert_eq!(
            res.body["download_url"],
            "https://qr.example.com/api/v1/qrcode/qrcode_99999ebcfd/download"
        );
    }
}

mod qrcode_read {
    use super::*;

    #[tokio::test]
    async fn get_returns_created_record() {
        let app = TestApp::spawn().await;
        let id = app.create_qrcode("example.com/page?x=1").await;
        assert_eq!(id, "qrcode_7e478d54d4");

        let res = app.get(&routes::qrcode(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["url"], "https://example.com/page?x=1");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::qrcode("qrcode_0000000000")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["message"], "QR code not found");

        let res = app.get_bytes(&routes::qrcode_download("qrcode_0000000000")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn download_is_png_attachment_that_decodes_to_url() {
        let app = TestApp::spawn().await;
        let id = app.create_qrcode("google.com").await;

        let res = app.get_bytes(&routes::qrcode_download(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.content_type.as_deref(), Some("image/png"));
        let disposition = res.content_disposition.unwrap();
        assert!(disposition.starts_with("attachment;"), "{disposition}");
        assert!(disposition.contains("qrcode_99999ebcfd.png"));
        assert_eq!(decode_qr(&res.bytes), "https://google.com");
    }

    #[tokio::test]
    async fn image_is_served_inline() {
        let app = TestApp::spawn().await;
        let id = app.create_qrcode("google.com").await;

        let res = app.get_bytes(&routes::qrcode_image(&id)).await;
        assert_eq!(res.status, 200);
        assert!(res.content_disposition.unwrap().starts_with("inline;"));
        assert_eq!(&res.bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::HEALTH).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "ok");
    }
}
