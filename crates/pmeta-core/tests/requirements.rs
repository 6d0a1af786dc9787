//! Integration test: names, versions, specifiers and markers agree with each
//! other when combined into requirements.

use pmeta_core::{
    canonicalize_name, ExtraName, MarkerTree, ParseError, ProjectName, Requirement, Version,
    VersionOrUrl,
};

#[test]
fn test_one_canonical_form_for_names_and_extras() {
    let project = ProjectName::new("My.Package__Name").unwrap();
    let extra = ExtraName::new("My.Package__Name").unwrap();
    assert_eq!(project.canonical(), "my-package-name");
    assert_eq!(extra.as_str(), project.canonical());
    assert_eq!(canonicalize_name("My.Package__Name"), project.canonical());

    let marker = MarkerTree::parse("extra == 'My.Package__Name'").unwrap();
    assert_eq!(marker.referenced_extras(), [project.canonical()]);
}

#[test]
fn test_requirement_parts() {
    let req: Requirement = "Foo_Bar[b,a] >= 1.0, != 1.5 ; python_version < '3.10'"
        .parse()
        .unwrap();
    assert_eq!(req.name().as_str(), "Foo_Bar");
    assert_eq!(req.canonical_name(), "foo-bar");
    assert_eq!(req.extras(), ["a", "b"]);
    match req.version_or_url() {
        Some(VersionOrUrl::Specifiers(set)) => assert_eq!(set.to_string(), "!=1.5,>=1.0"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        req.to_string(),
        r#"Foo_Bar[a,b]!=1.5,>=1.0; python_version < "3.10""#
    );
    assert_eq!(req.to_string().parse::<Requirement>().unwrap(), req);
}

#[test]
fn test_extra_marker_round_trip() {
    let docs = ExtraName::new("Docs").unwrap();
    let req = Requirement::parse("sphinx").unwrap().with_extra_marker(&docs);
    assert_eq!(req.to_string(), r#"sphinx; extra == "docs""#);
    assert_eq!(req.referenced_extras(), ["docs"]);
    assert_eq!(Requirement::parse(&req.to_string()).unwrap(), req);
}

#[test]
fn test_versions_normalize_before_comparison() {
    let a = Version::parse("1.0.0-alpha1").unwrap();
    let b = Version::parse("1.0.0a1").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "1.0.0a1");
    assert!(a.is_prerelease());
}

#[test]
fn test_errors_point_at_position_without_echoing() {
    let err = Requirement::parse("ok; os_name === ").unwrap_err();
    assert!(matches!(err, ParseError::InvalidMarker { .. }));
    assert!(!err.to_string().contains("os_name"));
}
