use super::*;

#[test]
fn from_file_name_strips_extension() {
    assert_eq!(ImageId::from_file_name("42.jpg"), Some(ImageId(42)));
    assert_eq!(ImageId::from_file_name("17.png"), Some(ImageId(17)));
}

#[test]
fn from_file_name_uses_last_component() {
    assert_eq!(
        ImageId::from_file_name("screenshots/nested/99.jpg"),
        Some(ImageId(99))
    );
}

#[test]
fn from_file_name_rejects_non_numeric() {
    assert_eq!(ImageId::from_file_name("cover.jpg"), None);
    assert_eq!(ImageId::from_file_name(".jpg"), None);
    assert_eq!(ImageId::from_file_name(""), None);
}

#[test]
fn file_name_matches_recovery() {
    let id = ImageId(1234);
    assert_eq!(id.file_name(), "1234.jpg");
    assert_eq!(ImageId::from_file_name(&id.file_name()), Some(id));
}

#[test]
fn parse_reports_bad_input() {
    let err = "abc".parse::<ImageId>().unwrap_err();
    assert_eq!(err.to_string(), "invalid image id: 'abc'");
    assert_eq!(" 7 ".parse::<ImageId>().unwrap(), ImageId(7));
}
