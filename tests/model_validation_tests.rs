use academy_portal::{
    auth::Role,
    models::{Course, PublicQuiz, Quiz, QuizQuestion, UpdateCourseRequest, UserProfile, VideoSource},
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_video_source_tagged_by_host() {
    let storage: VideoSource =
        serde_json::from_value(json!({ "host": "storage", "key": "videos/a.mp4" })).unwrap();
    assert_eq!(
        storage,
        VideoSource::Storage {
            key: "videos/a.mp4".to_string()
        }
    );

    let embed = VideoSource::Embed {
        url: "https://www.youtube.com/embed/abc".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&embed).unwrap(),
        json!({ "host": "embed", "url": "https://www.youtube.com/embed/abc" })
    );

    let unknown = serde_json::from_value::<VideoSource>(json!({ "host": "ftp", "url": "x" }));
    assert!(unknown.is_err());
}

#[test]
fn test_video_source_validation() {
    let valid = [
        VideoSource::Storage {
            key: "videos/1234.mp4".to_string(),
        },
        VideoSource::Embed {
            url: "https://player.vimeo.com/video/42".to_string(),
        },
    ];
    for source in &valid {
        assert!(source.is_valid(), "{:?} should be valid", source);
    }

    let invalid = [
        VideoSource::Storage {
            key: "avatars/1234.png".to_string(),
        },
        VideoSource::Storage {
            key: "videos/../secrets.txt".to_string(),
        },
        VideoSource::Embed {
            url: "http://player.vimeo.com/video/42".to_string(),
        },
        VideoSource::Embed {
            url: "javascript:alert(1)".to_string(),
        },
        VideoSource::Embed {
            url: "not a url".to_string(),
        },
    ];
    for source in &invalid {
        assert!(!source.is_valid(), "{:?} should be rejected", source);
    }
}

#[test]
fn test_course_video_columns() {
    let source = VideoSource::Storage {
        key: "videos/x.webm".to_string(),
    };
    let (host, reference) = source.to_columns();

    let course = Course {
        video_host: Some(host.to_string()),
        video_ref: Some(reference.to_string()),
        ..Course::default()
    };
    assert_eq!(course.video(), Some(source));

    let half_set = Course {
        video_host: Some("embed".to_string()),
        ..Course::default()
    };
    assert_eq!(half_set.video(), None);
    assert_eq!(Course::default().video(), None);
}

#[test]
fn test_update_course_request_omits_unset_fields() {
    let request = UpdateCourseRequest {
        title: Some("New title".to_string()),
        ..UpdateCourseRequest::default()
    };

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "title": "New title" })
    );

    let parsed: UpdateCourseRequest = serde_json::from_value(json!({})).unwrap();
    assert!(parsed.title.is_none() && parsed.description.is_none() && parsed.video.is_none());
}

#[test]
fn test_public_quiz_strips_answer_key() {
    let quiz = Quiz {
        id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        title: "Borrow checker".to_string(),
        questions: vec![QuizQuestion {
            prompt: "Can two &mut borrows overlap?".to_string(),
            options: vec!["yes".to_string(), "no".to_string()],
            correct_option: 1,
        }],
    };

    let public = PublicQuiz::from(quiz.clone());
    let value = serde_json::to_value(&public).unwrap();

    assert_eq!(public.id, quiz.id);
    assert_eq!(public.questions[0].options, quiz.questions[0].options);
    assert!(value["questions"][0].get("correct_option").is_none());
}

#[test]
fn test_role_serializes_lowercase() {
    let profile = UserProfile {
        id: Uuid::nil(),
        email: "a@academy.test".to_string(),
        role: Role::Creator,
        avatar_url: None,
    };
    let value = serde_json::to_value(&profile).unwrap();
    assert_eq!(value["role"], "creator");

    assert!(serde_json::from_value::<Role>(json!("superuser")).is_err());
}
