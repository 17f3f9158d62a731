/*!
 * Tests for language utility functions
 */

use lingosub::language_utils::{
    display_name, get_language_name, language_codes_match, normalize_detected, normalize_to_part1_or_part2t,
    normalize_to_part2t, validate_language_code, LanguageCodeType,
};

/// Test validation of language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldReturnCorrectType() {
    assert_eq!(validate_language_code("fa").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" EN ").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fas").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("per").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);

    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("123").is_err());
    assert!(validate_language_code("e").is_err());
}

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("fa").unwrap(), "fas");
    assert_eq!(normalize_to_part2t("per").unwrap(), "fas");
    assert_eq!(normalize_to_part2t("FRE").unwrap(), "fra");
    assert_eq!(normalize_to_part2t(" de ").unwrap(), "deu");
    assert!(normalize_to_part2t("").is_err());
}

/// Test two-letter codes are preferred when they exist
#[test]
fn test_normalize_to_part1_or_part2t_shouldPreferShortCodes() {
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("chi").unwrap(), "zh");
    assert_eq!(normalize_to_part1_or_part2t("es").unwrap(), "es");
}

/// Test matching of different language code formats
#[test]
fn test_language_codes_match_acrossCodeStyles_shouldCompareLanguages() {
    assert!(language_codes_match("fa", "per"));
    assert!(language_codes_match("fas", "FA"));
    assert!(language_codes_match("zh", "chi"));
    assert!(!language_codes_match("fa", "ar"));
    assert!(!language_codes_match("fa", "xx"));
}

/// Test language names used in prompts
#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("spa").unwrap(), "Spanish");
    assert!(get_language_name("xx").is_err());
    assert_eq!(display_name("es"), "Spanish");
    assert_eq!(display_name(" Elvish "), "Elvish");
}

/// Test detection replies are reduced to a code
#[test]
fn test_normalize_detected_withChattyReplies_shouldExtractCode() {
    assert_eq!(normalize_detected("es - Spanish"), Some("es".to_string()));
    assert_eq!(normalize_detected("'de'"), Some("de".to_string()));
    assert_eq!(normalize_detected("zh_Hant"), Some("zh".to_string()));
    assert_eq!(normalize_detected("   "), None);
}
