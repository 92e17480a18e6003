// ABOUTME: Integration tests for validated identifiers and names.
// ABOUTME: Tests parsing, validation, and redaction properties.

use deckhand::types::*;

mod image_ref_tests {
    use super::*;

    #[test]
    fn parse_simple_name() {
        let img = ImageRef::parse("nginx").unwrap();
        assert_eq!(img.name(), "nginx");
        assert_eq!(img.tag(), Some("latest"));
        assert!(img.registry().is_none());
        assert!(img.digest().is_none());
    }

    #[test]
    fn parse_registry_qualified() {
        let img = ImageRef::parse(
            "123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/woven-demo-app:latest",
        )
        .unwrap();
        assert_eq!(
            img.registry(),
            Some("123456789012.dkr.ecr.ap-northeast-1.amazonaws.com")
        );
        assert_eq!(img.name(), "woven-demo-app");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn parse_registry_with_port() {
        let img = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(img.registry(), Some("localhost:5000"));
        assert_eq!(img.name(), "app");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn parse_with_digest() {
        let digest = "sha256:abc123def456";
        let img = ImageRef::parse(&format!("app@{}", digest)).unwrap();
        assert_eq!(img.digest(), Some(digest));
        assert!(img.tag().is_none());
    }

    #[test]
    fn in_repository_formats_with_registry() {
        let repo = RepositoryName::new("woven-demo-app").unwrap();
        let img = ImageRef::in_repository(Some("registry.example.com"), &repo, "v2");
        assert_eq!(img.to_string(), "registry.example.com/woven-demo-app:v2");

        let bare = ImageRef::in_repository(None, &repo, "latest");
        assert_eq!(bare.to_string(), "woven-demo-app:latest");
    }

    #[test]
    fn rejects_empty_and_bad_characters() {
        assert!(matches!(ImageRef::parse(""), Err(ParseImageRefError::Empty)));
        assert!(matches!(
            ImageRef::parse("app name"),
            Err(ParseImageRefError::InvalidChar(' '))
        ));
        assert!(ImageRef::parse("registry.example.com/").is_err());
    }
}

mod resource_id_tests {
    use super::*;

    #[test]
    fn accepts_construct_ids() {
        for id in ["DemoALB", "demoInstanceRole", "TsukeAssets-CodeBuild-Action"] {
            assert_eq!(ResourceId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn rejects_invalid_ids() {
        assert_eq!(ResourceId::new(""), Err(ResourceIdError::Empty));
        assert_eq!(
            ResourceId::new("1stack"),
            Err(ResourceIdError::InvalidStart('1'))
        );
        assert_eq!(
            ResourceId::new("Demo ALB"),
            Err(ResourceIdError::InvalidChar(' '))
        );
        assert_eq!(
            ResourceId::new(&"a".repeat(256)),
            Err(ResourceIdError::TooLong)
        );
    }

    #[test]
    fn deserializes_with_validation() {
        let id: ResourceId = serde_json::from_str("\"DemoASG\"").unwrap();
        assert_eq!(id.as_str(), "DemoASG");
        assert!(serde_json::from_str::<ResourceId>("\"bad id\"").is_err());
    }
}

mod application_name_tests {
    use super::*;

    #[test]
    fn default_passes_validation() {
        let validated = ApplicationName::new(DEFAULT_APPLICATION).unwrap();
        assert_eq!(ApplicationName::default(), validated);
        assert_eq!(ApplicationName::default().as_str(), "woven-demo");
    }

    #[test]
    fn valid_names() {
        assert!(ApplicationName::new("woven-demo").is_ok());
        assert!(ApplicationName::new("demo").is_ok());
        assert!(ApplicationName::new("app2").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(matches!(
            ApplicationName::new(""),
            Err(ApplicationNameError::Empty)
        ));
        assert!(matches!(
            ApplicationName::new("-demo"),
            Err(ApplicationNameError::StartsWithHyphen)
        ));
        assert!(matches!(
            ApplicationName::new("demo-"),
            Err(ApplicationNameError::EndsWithHyphen)
        ));
        assert!(matches!(
            ApplicationName::new("Demo"),
            Err(ApplicationNameError::NotLowercase)
        ));
        assert!(matches!(
            ApplicationName::new("demo_app"),
            Err(ApplicationNameError::InvalidChar('_'))
        ));
        assert!(matches!(
            ApplicationName::new(&"a".repeat(64)),
            Err(ApplicationNameError::TooLong)
        ));
    }
}

mod repository_name_tests {
    use super::*;

    #[test]
    fn default_passes_validation() {
        let validated = RepositoryName::new(DEFAULT_REPOSITORY).unwrap();
        assert_eq!(RepositoryName::default(), validated);
        assert_eq!(RepositoryName::default().as_str(), "woven-demo-app");
    }

    #[test]
    fn valid_names() {
        assert!(RepositoryName::new("woven-demo-app").is_ok());
        assert!(RepositoryName::new("team/app.web").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert_eq!(RepositoryName::new("a"), Err(RepositoryNameError::Length));
        assert_eq!(
            RepositoryName::new("Demo"),
            Err(RepositoryNameError::InvalidChar('D'))
        );
        assert_eq!(
            RepositoryName::new("-demo"),
            Err(RepositoryNameError::BadBoundary)
        );
        assert_eq!(
            RepositoryName::new("demo--app"),
            Err(RepositoryNameError::ConsecutiveSeparators)
        );
    }
}

mod container_name_tests {
    use super::*;

    #[test]
    fn default_passes_validation() {
        let validated = ContainerName::new(DEFAULT_CONTAINER).unwrap();
        assert_eq!(ContainerName::default(), validated);
        assert_eq!(ContainerName::default().as_str(), "DemoECSTaskDefContainer");
    }

    #[test]
    fn valid_names() {
        assert!(ContainerName::new("DemoECSTaskDefContainer").is_ok());
        assert!(ContainerName::new("web_1-a").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(matches!(
            ContainerName::new(""),
            Err(ContainerNameError::Empty)
        ));
        assert!(matches!(
            ContainerName::new("web.app"),
            Err(ContainerNameError::InvalidChar('.'))
        ));
    }
}

mod secret_tests {
    use super::*;

    #[test]
    fn secret_is_redacted_everywhere_but_expose() {
        let secret = SecretValue::new("ghp_live_token");
        assert!(!secret.to_string().contains("ghp_live_token"));
        assert!(!format!("{secret:?}").contains("ghp_live_token"));
        assert!(
            !serde_json::to_string(&secret)
                .unwrap()
                .contains("ghp_live_token")
        );
        assert_eq!(secret.expose(), "ghp_live_token");
    }
}
