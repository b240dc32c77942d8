#[cfg(test)]
mod tests {

    mod slug_tests {
        use crate::services::slug::{generate_slug, resolve_slug, validate_slug};

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Hello World"), "hello-world");
        }

        #[test]
        fn test_generate_slug_special_characters() {
            assert_eq!(generate_slug("Faith, Hope & Love!"), "faith-hope-love");
        }

        #[test]
        fn test_generate_slug_unicode() {
            assert_eq!(generate_slug("Café au lait"), "cafe-au-lait");
        }

        #[test]
        fn test_generate_slug_leading_trailing_spaces() {
            assert_eq!(generate_slug("  Easter Sunday  "), "easter-sunday");
        }

        #[test]
        fn test_validate_slug_valid() {
            assert!(validate_slug("hello-world"));
            assert!(validate_slug("advent-2024"));
            assert!(validate_slug("a"));
        }

        #[test]
        fn test_validate_slug_invalid() {
            assert!(!validate_slug(""));
            assert!(!validate_slug("Hello-World"));
            assert!(!validate_slug("hello_world"));
            assert!(!validate_slug("hello world"));
            assert!(!validate_slug(&"a".repeat(201)));
        }

        #[test]
        fn test_resolve_slug_prefers_explicit() {
            assert_eq!(resolve_slug(Some("custom"), "Some Title"), "custom");
            assert_eq!(resolve_slug(Some("   "), "Some Title"), "some-title");
            assert_eq!(resolve_slug(None, "Some Title"), "some-title");
        }
    }

    mod spam_tests {
        use crate::config::SpamConfig;
        use crate::models::FormSubmission;
        use crate::services::spam::{
            check_submission, is_gibberish, is_plausible_name, normalize_phone, SilentReason,
            SpamVerdict, INVALID_FIRST_NAME, INVALID_LAST_NAME, INVALID_MESSAGE, INVALID_PHONE,
        };

        fn submission() -> FormSubmission {
            FormSubmission {
                first_name: "John".to_string(),
                last_name: "Smith".to_string(),
                email: "john@example.com".to_string(),
                ..Default::default()
            }
        }

        #[test]
        fn test_random_casing_is_gibberish() {
            let config = SpamConfig::default();
            assert!(is_gibberish(&config, "LgawoWOCGZTIanjR"));
        }

        #[test]
        fn test_real_names_are_not_gibberish() {
            let config = SpamConfig::default();
            assert!(!is_gibberish(&config, "Mary-Jane O'Brien"));
            assert!(!is_gibberish(&config, "McDonald"));
            assert!(!is_gibberish(&config, "John"));
        }

        #[test]
        fn test_accented_names_are_plausible() {
            let config = SpamConfig::default();
            assert!(is_plausible_name(&config, "Björn"));
            assert!(is_plausible_name(&config, "Søren"));
            assert!(is_plausible_name(&config, "Zoë"));
            assert!(is_plausible_name(&config, "Núñez"));
        }

        #[test]
        fn test_extreme_render_timestamps_do_not_overflow() {
            let config = SpamConfig::default();
            let now_ms = 1_700_000_000_000;

            let s = FormSubmission {
                form_rendered_at: Some(i64::MIN.to_string()),
                ..submission()
            };
            assert_eq!(check_submission(&config, &s, now_ms), SpamVerdict::Pass);

            let s = FormSubmission {
                form_rendered_at: Some(i64::MAX.to_string()),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, now_ms),
                SpamVerdict::Silent(SilentReason::TooFast)
            );
        }

        #[test]
        fn test_consonant_run_is_gibberish() {
            let config = SpamConfig::default();
            assert!(is_gibberish(&config, "asdfghjkl"));
        }

        #[test]
        fn test_no_vowels_is_gibberish() {
            let config = SpamConfig::default();
            assert!(is_gibberish(&config, "Xkcdq"));
        }

        #[test]
        fn test_ordinary_message_is_not_gibberish() {
            let config = SpamConfig::default();
            assert!(!is_gibberish(
                &config,
                "Hi, I'd love to learn more about your youth group."
            ));
        }

        #[test]
        fn test_name_length_bounds() {
            let config = SpamConfig::default();
            assert!(!is_plausible_name(&config, "A"));
            assert!(is_plausible_name(&config, "Li"));
            assert!(!is_plausible_name(&config, &"Ana".repeat(17)));
            assert!(!is_plausible_name(&config, "12"));
        }

        #[test]
        fn test_normalize_phone() {
            assert_eq!(normalize_phone("5551234567").as_deref(), Some("5551234567"));
            assert_eq!(normalize_phone("(555) 123-4567").as_deref(), Some("5551234567"));
            assert_eq!(normalize_phone("+1 555 123 4567").as_deref(), Some("5551234567"));
        }

        #[test]
        fn test_normalize_phone_rejects_bad_numbers() {
            assert_eq!(normalize_phone("0551234567"), None);
            assert_eq!(normalize_phone("1551234567"), None);
            assert_eq!(normalize_phone("123"), None);
            assert_eq!(normalize_phone(""), None);
        }

        #[test]
        fn test_clean_submission_passes() {
            let config = SpamConfig::default();
            assert_eq!(check_submission(&config, &submission(), 0), SpamVerdict::Pass);
        }

        #[test]
        fn test_honeypot_is_silent_and_checked_first() {
            let config = SpamConfig::default();
            let s = FormSubmission {
                first_name: "LgawoWOCGZTIanjR".to_string(),
                website: Some("http://spam.example".to_string()),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 0),
                SpamVerdict::Silent(SilentReason::Honeypot)
            );
        }

        #[test]
        fn test_bad_fields_are_rejected_with_messages() {
            let config = SpamConfig::default();

            let s = FormSubmission {
                first_name: "LgawoWOCGZTIanjR".to_string(),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 0),
                SpamVerdict::Reject(INVALID_FIRST_NAME.to_string())
            );

            let s = FormSubmission {
                last_name: "Q".to_string(),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 0),
                SpamVerdict::Reject(INVALID_LAST_NAME.to_string())
            );

            let s = FormSubmission {
                phone: Some("123".to_string()),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 0),
                SpamVerdict::Reject(INVALID_PHONE.to_string())
            );

            let s = FormSubmission {
                message: Some("xkcdqwrtzp".to_string()),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 0),
                SpamVerdict::Reject(INVALID_MESSAGE.to_string())
            );
        }

        #[test]
        fn test_blank_phone_is_ignored() {
            let config = SpamConfig::default();
            let s = FormSubmission {
                phone: Some("  ".to_string()),
                ..submission()
            };
            assert_eq!(check_submission(&config, &s, 0), SpamVerdict::Pass);
        }

        #[test]
        fn test_fast_submission_is_silent() {
            let config = SpamConfig::default();
            let s = FormSubmission {
                form_rendered_at: Some("1000".to_string()),
                ..submission()
            };
            assert_eq!(
                check_submission(&config, &s, 2000),
                SpamVerdict::Silent(SilentReason::TooFast)
            );
            assert_eq!(check_submission(&config, &s, 10_000), SpamVerdict::Pass);
        }

        #[test]
        fn test_missing_timestamp_skips_timing_check() {
            let config = SpamConfig::default();
            let s = FormSubmission {
                form_rendered_at: Some(String::new()),
                ..submission()
            };
            assert_eq!(check_submission(&config, &s, 1), SpamVerdict::Pass);
        }
    }

    mod email_tests {
        use crate::config::EmailConfig;
        use crate::services::email::{
            classify_error, idempotency_key, recipients, EmailError, RetryPolicy,
        };
        use std::time::Duration;

        #[test]
        fn test_recipients_prefers_numbered_addresses() {
            let config = EmailConfig {
                notify_to: Some("office@example.org".to_string()),
                notify_to_1: Some("pastor@example.org".to_string()),
                notify_to_3: Some(" admin@example.org ".to_string()),
                ..Default::default()
            };
            assert_eq!(
                recipients(&config).unwrap(),
                vec!["pastor@example.org", "admin@example.org"]
            );
        }

        #[test]
        fn test_recipients_splits_comma_list() {
            let config = EmailConfig {
                notify_to: Some("a@example.org, b@example.org,".to_string()),
                ..Default::default()
            };
            assert_eq!(recipients(&config).unwrap(), vec!["a@example.org", "b@example.org"]);
        }

        #[test]
        fn test_recipients_none_configured() {
            let config = EmailConfig::default();
            assert_eq!(recipients(&config), Err(EmailError::NoRecipients));
        }

        #[test]
        fn test_classify_error_by_name() {
            assert!(matches!(
                classify_error(429, "rate_limit_exceeded", "slow down"),
                EmailError::RateLimitExceeded(_)
            ));
            assert!(matches!(
                classify_error(500, "internal_server_error", ""),
                EmailError::InternalServerError(_)
            ));
            assert!(matches!(
                classify_error(500, "application_error", ""),
                EmailError::ApplicationError(_)
            ));
            assert!(matches!(
                classify_error(401, "invalid_api_key", ""),
                EmailError::Unauthorized(_)
            ));
            assert!(matches!(
                classify_error(422, "validation_error", ""),
                EmailError::Validation(_)
            ));
        }

        #[test]
        fn test_classify_error_falls_back_to_status() {
            assert!(matches!(classify_error(429, "", ""), EmailError::RateLimitExceeded(_)));
            assert!(matches!(classify_error(503, "", ""), EmailError::InternalServerError(_)));
            assert!(matches!(classify_error(400, "", ""), EmailError::Validation(_)));
        }

        #[test]
        fn test_only_transient_errors_retry() {
            assert!(EmailError::RateLimitExceeded(String::new()).is_retryable());
            assert!(EmailError::InternalServerError(String::new()).is_retryable());
            assert!(EmailError::ApplicationError(String::new()).is_retryable());
            assert!(!EmailError::Validation(String::new()).is_retryable());
            assert!(!EmailError::Unauthorized(String::new()).is_retryable());
            assert!(!EmailError::MissingApiKey.is_retryable());
            assert!(!EmailError::NoRecipients.is_retryable());
        }

        #[test]
        fn test_retry_delays_double() {
            let policy = RetryPolicy::default();
            assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
            assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
            assert_eq!(policy.delay_for_retry(3), Duration::from_secs(8));
        }

        #[test]
        fn test_retry_policy_from_config() {
            let config = EmailConfig {
                max_retries: 5,
                backoff_base_ms: 250,
                ..Default::default()
            };
            let policy = RetryPolicy::from_config(&config);
            assert_eq!(policy.max_retries, 5);
            assert_eq!(policy.delay_for_retry(1), Duration::from_millis(500));
        }

        #[test]
        fn test_idempotency_key_is_scoped_and_unique() {
            let a = idempotency_key("contact");
            let b = idempotency_key("contact");
            assert!(a.starts_with("contact/"));
            assert_eq!(a.len(), "contact/".len() + 36);
            assert_ne!(a, b);
        }
    }

    mod crm_tests {
        use crate::services::crm::CrmStatus;

        #[test]
        fn test_failed_status_is_flagged_for_staff() {
            let status = CrmStatus::Failed("http 500: boom".to_string());
            assert!(status.is_failed());
            assert!(status.to_string().contains("FAILED"));
            assert!(status.to_string().contains("manually"));
        }

        #[test]
        fn test_other_statuses_are_not_failures() {
            assert!(!CrmStatus::Created("1".to_string()).is_failed());
            assert!(!CrmStatus::Existing("2".to_string()).is_failed());
            assert!(!CrmStatus::Skipped.is_failed());
        }
    }

    mod form_tests {
        use crate::models::{FormKind, FormSubmission};
        use crate::services::forms::format_phone;

        #[test]
        fn test_form_kind_from_str() {
            assert_eq!("contact".parse::<FormKind>(), Ok(FormKind::Contact));
            assert_eq!("plan-a-visit".parse::<FormKind>(), Ok(FormKind::PlanAVisit));
            assert_eq!("visit".parse::<FormKind>(), Ok(FormKind::PlanAVisit));
            assert_eq!("Get-Involved".parse::<FormKind>(), Ok(FormKind::GetInvolved));
            assert!("newsletter".parse::<FormKind>().is_err());
        }

        #[test]
        fn test_extra_fields_keep_display_order() {
            let s = FormSubmission {
                visit_date: Some("2024-06-02".to_string()),
                party_size: Some("4".to_string()),
                interests: Some("  ".to_string()),
                ..Default::default()
            };
            assert_eq!(
                s.extra_fields(),
                vec![
                    ("Visit date", "2024-06-02".to_string()),
                    ("Party size", "4".to_string()),
                ]
            );
        }

        #[test]
        fn test_rendered_at_parsing() {
            let mut s = FormSubmission::default();
            assert_eq!(s.rendered_at_ms(), None);
            s.form_rendered_at = Some("1700000000000".to_string());
            assert_eq!(s.rendered_at_ms(), Some(1_700_000_000_000));
            s.form_rendered_at = Some("soon".to_string());
            assert_eq!(s.rendered_at_ms(), None);
        }

        #[test]
        fn test_format_phone() {
            assert_eq!(format_phone("5551234567"), "(555) 123-4567");
            assert_eq!(format_phone("123"), "123");
        }
    }

    mod validation_tests {
        use crate::services::validation::{
            parse_date, validate_email, validate_http_url, validate_image_url,
        };

        #[test]
        fn test_validate_email() {
            assert!(validate_email("someone@example.org").is_ok());
            assert_eq!(validate_email("").unwrap_err().0, "Email is required.");
            assert_eq!(
                validate_email("not-an-email").unwrap_err().0,
                "Please enter a valid email address."
            );
        }

        #[test]
        fn test_parse_date() {
            assert!(parse_date("2024-02-29").is_ok());
            assert!(parse_date("2023-02-29").is_err());
            assert!(parse_date("03/10/2024").is_err());
        }

        #[test]
        fn test_urls() {
            assert!(validate_http_url("https://youtu.be/abc", "Video URL").is_ok());
            assert!(validate_http_url("ftp://example.com", "Video URL").is_err());
            assert!(validate_image_url("/media/abc.png", "Thumbnail").is_ok());
            assert!(validate_image_url("javascript:alert(1)", "Thumbnail").is_err());
        }
    }

    mod auth_tests {
        use crate::services::auth::{
            generate_password, generate_session_token, hash_password, validate_password,
            verify_password,
        };

        #[test]
        fn test_hash_password_produces_hash() {
            let hash = hash_password("Password123").unwrap();
            assert!(hash.starts_with("$argon2"));
        }

        #[test]
        fn test_hash_password_unique() {
            let a = hash_password("Password123").unwrap();
            let b = hash_password("Password123").unwrap();
            assert_ne!(a, b);
        }

        #[test]
        fn test_verify_password() {
            let hash = hash_password("Password123").unwrap();
            assert!(verify_password("Password123", &hash));
            assert!(!verify_password("Password124", &hash));
            assert!(!verify_password("Password123", "not-a-hash"));
        }

        #[test]
        fn test_password_policy() {
            assert!(validate_password("Password123").is_ok());
            assert!(validate_password("Pass1").is_err());
            assert!(validate_password("password123").is_err());
            assert!(validate_password("PASSWORD123").is_err());
            assert!(validate_password("Password").is_err());
        }

        #[test]
        fn test_generated_password_meets_policy() {
            for _ in 0..20 {
                let password = generate_password();
                assert_eq!(password.len(), 20);
                assert!(validate_password(&password).is_ok());
            }
        }

        #[test]
        fn test_generate_session_token_url_safe() {
            let token = generate_session_token();
            assert_eq!(token.len(), 43);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_ne!(token, generate_session_token());
        }
    }

    mod embed_tests {
        use crate::web::embed_url;

        #[test]
        fn test_youtube_links() {
            assert_eq!(
                embed_url("https://www.youtube.com/watch?v=abc123").as_deref(),
                Some("https://www.youtube.com/embed/abc123")
            );
            assert_eq!(
                embed_url("https://youtu.be/abc123").as_deref(),
                Some("https://www.youtube.com/embed/abc123")
            );
            assert_eq!(
                embed_url("https://www.youtube.com/live/xyz").as_deref(),
                Some("https://www.youtube.com/embed/xyz")
            );
        }

        #[test]
        fn test_vimeo_links() {
            assert_eq!(
                embed_url("https://vimeo.com/12345").as_deref(),
                Some("https://player.vimeo.com/video/12345")
            );
        }

        #[test]
        fn test_unknown_hosts_are_not_embedded() {
            assert_eq!(embed_url("https://example.com/sermon.mp4"), None);
            assert_eq!(embed_url("not a url"), None);
        }
    }

    mod config_tests {
        use crate::config::{AuthConfig, Config};
        use std::path::Path;

        const MINIMAL: &str = r#"
[site]
title = "Grace Church"
url = "http://localhost:3000"

[database]
path = "data/steeple.db"
"#;

        #[test]
        fn test_config_load_missing_file() {
            let result = Config::load(Path::new("/nonexistent/steeple.toml"));
            assert!(result.is_err());
        }

        #[test]
        fn test_config_defaults() {
            let config: Config = toml::from_str(MINIMAL).unwrap();
            config.validate().unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.sermons.page_size, 12);
            assert_eq!(config.email.max_retries, 3);
            assert_eq!(config.email.backoff_base_ms, 1000);
            assert_eq!(config.email.api_url, "https://api.resend.com");
            assert_eq!(config.spam.min_submit_ms, 3000);
            assert_eq!(config.uploads.max_bytes, 10 * 1024 * 1024);
        }

        #[test]
        fn test_config_load_valid_toml() {
            use std::io::Write;
            let config_path =
                std::env::temp_dir().join(format!("steeple_{}.toml", uuid::Uuid::new_v4()));

            let config_content = r#"
[site]
title = "Grace Church"
url = "https://grace.example.org"
giving_url = "https://give.example.org"

[database]
path = "data/steeple.db"

[sermons]
page_size = 6

[email]
notify_to = "office@example.org"
max_retries = 1

[spam]
min_submit_ms = 1500
"#;

            let mut file = std::fs::File::create(&config_path).unwrap();
            file.write_all(config_content.as_bytes()).unwrap();

            let config = Config::load(&config_path).unwrap();
            assert_eq!(config.site.title, "Grace Church");
            assert_eq!(config.sermons.page_size, 6);
            assert_eq!(config.email.max_retries, 1);
            assert_eq!(config.spam.min_submit_ms, 1500);
            assert_eq!(config.spam.max_consonant_run, 4);

            std::fs::remove_file(&config_path).ok();
        }

        #[test]
        fn test_config_rejects_bad_page_size() {
            let mut config: Config = toml::from_str(MINIMAL).unwrap();
            config.sermons.page_size = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_session_days() {
            let days = |s: &str| {
                AuthConfig {
                    session_lifetime: s.to_string(),
                }
                .session_days()
            };
            assert_eq!(days("7d").unwrap(), 7);
            assert_eq!(days("48h").unwrap(), 2);
            assert_eq!(days("30").unwrap(), 30);
            assert!(days("0d").is_err());
            assert!(days("forever").is_err());
        }
    }

    mod rate_limiter_tests {
        use crate::web::security::RateLimiter;
        use std::time::Duration;

        #[test]
        fn test_locks_out_after_max_failures() {
            let limiter = RateLimiter::new(3, Duration::from_secs(60));
            for _ in 0..3 {
                assert!(limiter.check("admin@example.org"));
                limiter.record_attempt("admin@example.org");
            }
            assert!(!limiter.check("admin@example.org"));
            assert!(limiter.check("other@example.org"));

            limiter.clear("admin@example.org");
            assert!(limiter.check("admin@example.org"));
        }

        #[test]
        fn test_check_does_not_track_unknown_keys() {
            let limiter = RateLimiter::default();
            for i in 0..100 {
                assert!(limiter.check(&format!("user{}@example.org", i)));
            }
            assert_eq!(limiter.tracked_keys(), 0);
        }

        #[test]
        fn test_expired_failures_are_dropped() {
            let limiter = RateLimiter::new(5, Duration::ZERO);
            for i in 0..1000 {
                limiter.record_attempt(&format!("user{}@example.org", i));
            }
            assert_eq!(limiter.tracked_keys(), 1);

            assert!(limiter.check("user999@example.org"));
            assert_eq!(limiter.tracked_keys(), 0);
        }
    }
}
