use formforge_core::FieldType;
use formforge_engine::{
    DOCUMENT_FILENAME, EngineError, ErrorKind, Submission, UploadedFile, Widget,
};
use formforge_harness::{RecordingDocumentService, TestApp, png};
use serde_json::json;

// ============================================================================
// End to end
// ============================================================================

#[test]
fn survey_submission_reaches_document_service() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::new()?;
    let form_id = app.create_survey()?;

    let rendered = app.engine.render_form(form_id)?;
    assert_eq!(rendered.label, "Survey");
    let keys: Vec<_> = rendered.instance.keys().collect();
    assert_eq!(keys, vec!["name", "favorite"]);
    assert_eq!(
        rendered.instance.get("favorite").ok_or("favorite missing")?.widget,
        Widget::Select {
            choices: vec!["Red".to_string(), "Blue".to_string()]
        }
    );

    let submission = Submission::new()
        .text("csrf_token", "t0k3n")
        .text("name", "Alice")
        .text("favorite", "Red")
        .text("submit", "Submit");
    let document = app.engine.submit_form(form_id, &submission)?;
    assert_eq!(document.filename, DOCUMENT_FILENAME);
    assert_eq!(document.bytes, RecordingDocumentService::DOCUMENT);

    let requests = app.documents().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].data, json!({"name": "Alice", "favorite": "Red"}));
    assert_eq!(requests[0].template, b"survey template");
    assert!(requests[0].files.is_empty());
    Ok(())
}

#[test]
fn invalid_submission_is_not_forwarded() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::new()?;
    let form_id = app.create_survey()?;

    let submission = Submission::new().text("name", "").text("favorite", "Green");
    let err = app.engine.submit_form(form_id, &submission).unwrap_err();
    let EngineError::InvalidSubmission(errors) = &err else {
        return Err(format!("expected invalid submission, got {err}").into());
    };
    let keys: Vec<_> = errors.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["name", "favorite"]);
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(app.documents().request_count(), 0);
    Ok(())
}

#[test]
fn composite_fields_arrive_grouped() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::new()?;
    let mut editor = app.editor();
    editor.add_static("agree", FieldType::Bool, "Agree")?;
    editor.add_static("body", FieldType::TextArea, "Body")?;
    editor.add_static("photo", FieldType::File, "Photo")?;
    let form_id = editor.commit("Report", b"report template")?;

    let submission = Submission::new()
        .text("agree", "y")
        .text("body-source", "<p>Hello</p>")
        .text("body-__type", "html")
        .text("photo-__type", "image")
        .file("photo-source", UploadedFile::new("me.png", png(4, 3)?));
    app.engine.submit_form(form_id, &submission)?;

    let requests = app.documents().requests();
    let request = &requests[0];
    assert_eq!(
        request.data,
        json!({
            "agree": "y",
            "body": {"source": "<p>Hello</p>", "__type": "html"},
            "photo": {
                "__type": "image",
                "source": "image0.png",
                "__height": 3,
                "__width": 4
            }
        })
    );
    assert_eq!(request.files.len(), 1);
    assert_eq!(request.files[0].filename, "image0.png");
    assert_eq!(request.files[0].mime, "image/png");
    Ok(())
}

#[test]
fn unchecked_checkbox_is_simply_absent() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::new()?;
    let mut editor = app.editor();
    editor.add_static("agree", FieldType::Bool, "Agree")?;
    let form_id = editor.commit("Consent", b"tpl")?;

    app.engine.submit_form(form_id, &Submission::new())?;
    assert_eq!(app.documents().requests()[0].data, json!({}));
    Ok(())
}

// ============================================================================
// Document service failures
// ============================================================================

#[test]
fn unreachable_service_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::with_documents(RecordingDocumentService::unreachable())?;
    let form_id = app.create_survey()?;
    assert!(!app.engine.document_service_available());

    let submission = Submission::new().text("name", "Alice").text("favorite", "Blue");
    let err = app.engine.submit_form(form_id, &submission).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    Ok(())
}

#[test]
fn non_success_status_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = TestApp::with_documents(RecordingDocumentService::failing(500))?;
    let form_id = app.create_survey()?;
    assert!(app.engine.document_service_available());

    let submission = Submission::new().text("name", "Alice").text("favorite", "Blue");
    let err = app.engine.submit_form(form_id, &submission).unwrap_err();
    assert!(matches!(err, EngineError::Upstream { status: 500 }));
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(app.documents().request_count(), 1);
    Ok(())
}
