use super::*;

#[test]
fn campaign_status_round_trips_through_strings() {
    for status in [
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
    ] {
        assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
    }
}

#[test]
fn unknown_campaign_status_is_rejected() {
    assert!("archived".parse::<CampaignStatus>().is_err());
}

#[test]
fn ad_type_round_trips_through_strings() {
    for ad_type in [
        AdType::Text,
        AdType::Banner,
        AdType::Video,
        AdType::Hyperlink,
        AdType::Popup,
        AdType::Thinking,
    ] {
        assert_eq!(ad_type.as_str().parse::<AdType>().unwrap(), ad_type);
    }
}

#[test]
fn hyperlink_and_text_are_not_display_class() {
    assert!(!AdType::Hyperlink.is_display());
    assert!(!AdType::Text.is_display());
    assert!(AdType::Banner.is_display());
    assert!(AdType::Popup.is_display());
    assert!(AdType::Thinking.is_display());
    assert!(AdType::Video.is_display());
}

#[test]
fn display_types_excludes_inline_formats() {
    let display = AdType::display_types();
    assert!(!display.contains(&AdType::Hyperlink));
    assert!(!display.contains(&AdType::Text));
    assert_eq!(display.len(), 4);
}

#[test]
fn placement_uses_snake_case_spelling() {
    assert_eq!(Placement::ChatInline.as_str(), "chat_inline");
    assert_eq!(Placement::ContentPromo.as_str(), "content_promo");
    assert_eq!(
        "chat_inline".parse::<Placement>().unwrap(),
        Placement::ChatInline
    );
}

#[test]
fn impression_status_round_trips_through_strings() {
    for status in [
        ImpressionStatus::Pending,
        ImpressionStatus::Clicked,
        ImpressionStatus::Billed,
    ] {
        assert_eq!(
            status.as_str().parse::<ImpressionStatus>().unwrap(),
            status
        );
    }
}

#[test]
fn click_metadata_deserializes_with_defaults() {
    let metadata: ClickMetadata = serde_json::from_str("{}").unwrap();
    assert_eq!(metadata.version, 1);
    assert!(metadata.source.is_none());
    assert!(metadata.user_agent.is_none());
    assert!(metadata.referrer.is_none());
}

#[test]
fn click_metadata_drops_unknown_fields() {
    let metadata: ClickMetadata =
        serde_json::from_str(r#"{"source":"chat","unknown_field":42}"#).unwrap();
    assert_eq!(metadata.source.as_deref(), Some("chat"));
}
