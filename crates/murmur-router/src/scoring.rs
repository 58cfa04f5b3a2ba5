// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic complexity scoring and the route decision.
//!
//! Scoring is a pure function of `(message, routing config)`: zero cost,
//! zero latency, no network. The token estimate is deliberately the crude
//! `ceil(chars / 4)` approximation; downstream behavior is calibrated to
//! this exact formula, so it must not be swapped for a real tokenizer.

use std::sync::LazyLock;

use murmur_config::RoutingConfig;
use murmur_core::{ExecutorStatus, Priority, Route, RouterMode, TaskProfile};
use regex::Regex;

/// Markers suggesting a multi-step request (substring, case-folded).
const MULTI_STEP_MARKERS: &[&str] = &[
    "then", "after", "next", "first", "second", "third", "finally", "step",
];

/// Enumerated-list shapes like "1. do this" or "2) do that".
static ENUMERATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\s*[.)]\s+\w+").expect("enumeration pattern is valid"));

/// Domain keyword families. A hit in any family adds the domain bump
/// once; families never stack.
const DOMAIN_FAMILIES: &[&[&str]] = &[
    // code
    &["code", "function", "debug", "compile", "script", "program", "algorithm", "refactor"],
    // math
    &["math", "calculate", "equation", "integral", "derivative", "theorem", "proof"],
    // law
    &["law", "legal", "contract", "regulation", "statute", "compliance"],
];

/// Markers demanding an immediate answer.
const REALTIME_MARKERS: &[&str] = &["now", "immediately", "quick", "fast", "urgent"];

/// Markers demanding on-device handling.
const PRIVACY_MARKERS: &[&str] = &["private", "confidential", "secret", "personal"];

/// Approximate token count: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Heuristic complexity in `[0, 10]`.
pub fn score_complexity(text: &str) -> u8 {
    let lower = text.to_lowercase();
    let mut score = 0u32;

    let tokens = estimate_tokens(text);
    if tokens >= 1_000 {
        score += 2;
    }
    if tokens >= 4_000 {
        score += 2;
    }

    if MULTI_STEP_MARKERS.iter().any(|m| lower.contains(m)) || ENUMERATION.is_match(text) {
        score += 3;
    }

    if DOMAIN_FAMILIES
        .iter()
        .any(|family| family.iter().any(|kw| lower.contains(kw)))
    {
        score += 2;
    }

    score.min(10) as u8
}

/// Priority from complexity and the realtime flag.
pub fn derive_priority(complexity: u8, realtime: bool) -> Priority {
    if complexity >= 8 || realtime {
        Priority::Urgent
    } else if complexity >= 4 {
        Priority::Normal
    } else {
        Priority::Background
    }
}

/// Score a message under a routing config: complexity, flags, priority.
pub fn score(text: &str, config: &RoutingConfig) -> TaskProfile {
    let lower = text.to_lowercase();
    let complexity = score_complexity(text);
    let realtime = REALTIME_MARKERS.iter().any(|m| lower.contains(m));
    let privacy =
        config.privacy_mode || PRIVACY_MARKERS.iter().any(|m| lower.contains(m));

    TaskProfile {
        complexity,
        priority: derive_priority(complexity, realtime),
        realtime,
        privacy,
    }
}

/// The route decision. Rules apply in order; first match wins:
///
/// 1. privacy forces LOCAL unconditionally (a missing local executor
///    fails the task at dispatch, it is never rerouted to the cloud)
/// 2. realtime with a loaded local model goes LOCAL
/// 3. manual local mode, falling back to CLOUD when nothing is loaded
/// 4. manual cloud mode, falling back to LOCAL when the cloud is down
/// 5. auto: complexity at or above the threshold prefers CLOUD,
///    otherwise prefer LOCAL; each falls back to the other executor
pub fn decide_route(
    profile: &TaskProfile,
    config: &RoutingConfig,
    status: ExecutorStatus,
) -> Route {
    if profile.privacy {
        return Route::Local;
    }
    if profile.realtime && status.local_model_loaded {
        return Route::Local;
    }
    match config.mode {
        RouterMode::Local => {
            if status.local_model_loaded {
                Route::Local
            } else {
                Route::Cloud
            }
        }
        RouterMode::Cloud => {
            if status.cloud_available {
                Route::Cloud
            } else {
                Route::Local
            }
        }
        RouterMode::Auto => {
            if profile.complexity >= config.threshold {
                if status.cloud_available {
                    Route::Cloud
                } else {
                    Route::Local
                }
            } else if status.local_model_loaded {
                Route::Local
            } else {
                Route::Cloud
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RoutingConfig {
        RoutingConfig::default()
    }

    fn status(local: bool, cloud: bool) -> ExecutorStatus {
        ExecutorStatus {
            local_model_loaded: local,
            cloud_available: cloud,
        }
    }

    #[test]
    fn token_estimate_formula() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(4_000)), 1_000);
    }

    #[test]
    fn trivial_message_scores_zero() {
        assert_eq!(score_complexity("Hi"), 0);
        assert_eq!(score_complexity("What color is the sky"), 0);
    }

    #[test]
    fn length_tiers_accumulate() {
        let medium = "z ".repeat(2_200); // ~1100 tokens
        assert_eq!(score_complexity(&medium), 2);
        let huge = "z ".repeat(8_200); // ~4100 tokens
        assert_eq!(score_complexity(&huge), 4);
    }

    #[test]
    fn multi_step_markers_add_three() {
        assert_eq!(score_complexity("do this, THEN do that"), 3);
        assert_eq!(score_complexity("1. unpack 2) assemble"), 3);
        // Substring semantics are intentional: "thence" contains "then".
        assert_eq!(score_complexity("thence we go"), 3);
    }

    #[test]
    fn domain_families_count_once() {
        assert_eq!(score_complexity("review my code"), 2);
        // Two families present still add only one bump each family
        // shares; families never stack.
        assert_eq!(score_complexity("code and math homework"), 2);
    }

    #[test]
    fn long_multi_step_scenario_scores_seven() {
        // ~4100 tokens of filler plus ordering words.
        let mut text = "lorem ipsum dolor sit amet ".repeat(600);
        text.push_str("first unpack it, second sort it, finally report");
        assert!(estimate_tokens(&text) >= 4_000);
        assert_eq!(score_complexity(&text), 7);
    }

    #[test]
    fn score_is_capped_at_ten() {
        let mut text = "x".repeat(20_000);
        text.push_str(" first then finally step code math law");
        assert_eq!(score_complexity(&text), 9); // 2+2+3+2
        // No combination exceeds 10 by construction, but the clamp holds.
        assert!(score_complexity(&text) <= 10);
    }

    #[test]
    fn scoring_is_deterministic_and_bounded() {
        let samples = [
            "",
            "Hi",
            "code the first step now",
            "a confidential legal matter",
            &"lorem ".repeat(5_000),
        ];
        for text in samples {
            let a = score(text, &cfg());
            let b = score(text, &cfg());
            assert_eq!(a, b, "same input must score identically");
            assert!(a.complexity <= 10);
        }
    }

    #[test]
    fn realtime_and_privacy_flags() {
        let p = score("answer this now", &cfg());
        assert!(p.realtime);
        assert!(!p.privacy);
        assert_eq!(p.priority, Priority::Urgent);

        let p = score("this is confidential", &cfg());
        assert!(p.privacy);
        assert!(!p.realtime);

        // Config-driven privacy without any keyword.
        let mut config = cfg();
        config.privacy_mode = true;
        let p = score("summarise this document", &config);
        assert!(p.privacy);
    }

    #[test]
    fn flags_do_not_change_complexity() {
        assert_eq!(score_complexity("do it now"), 0);
        assert_eq!(score_complexity("keep it secret"), 0);
    }

    #[test]
    fn priority_thresholds() {
        assert_eq!(derive_priority(0, false), Priority::Background);
        assert_eq!(derive_priority(3, false), Priority::Background);
        assert_eq!(derive_priority(4, false), Priority::Normal);
        assert_eq!(derive_priority(7, false), Priority::Normal);
        assert_eq!(derive_priority(8, false), Priority::Urgent);
        assert_eq!(derive_priority(0, true), Priority::Urgent);
    }

    #[test]
    fn privacy_always_routes_local() {
        let profile = TaskProfile {
            complexity: 10,
            priority: Priority::Urgent,
            realtime: false,
            privacy: true,
        };
        for mode in [RouterMode::Auto, RouterMode::Local, RouterMode::Cloud] {
            for threshold in [0, 6, 10] {
                for local in [false, true] {
                    for cloud in [false, true] {
                        let config = RoutingConfig {
                            mode,
                            threshold,
                            privacy_mode: false,
                        };
                        assert_eq!(
                            decide_route(&profile, &config, status(local, cloud)),
                            Route::Local,
                            "privacy must pin LOCAL for mode={mode} local={local} cloud={cloud}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn realtime_prefers_loaded_local_over_cloud_mode() {
        let profile = TaskProfile {
            complexity: 2,
            priority: Priority::Urgent,
            realtime: true,
            privacy: false,
        };
        let config = RoutingConfig {
            mode: RouterMode::Cloud,
            ..cfg()
        };
        assert_eq!(
            decide_route(&profile, &config, status(true, true)),
            Route::Local
        );
        // Without a loaded model the mode rules take over.
        assert_eq!(
            decide_route(&profile, &config, status(false, true)),
            Route::Cloud
        );
    }

    #[test]
    fn manual_modes_fall_back_on_unavailability() {
        let profile = score("plain message", &cfg());

        let local_mode = RoutingConfig {
            mode: RouterMode::Local,
            ..cfg()
        };
        assert_eq!(decide_route(&profile, &local_mode, status(true, true)), Route::Local);
        assert_eq!(decide_route(&profile, &local_mode, status(false, true)), Route::Cloud);

        let cloud_mode = RoutingConfig {
            mode: RouterMode::Cloud,
            ..cfg()
        };
        assert_eq!(decide_route(&profile, &cloud_mode, status(true, true)), Route::Cloud);
        assert_eq!(decide_route(&profile, &cloud_mode, status(true, false)), Route::Local);
    }

    #[test]
    fn auto_mode_threshold_split() {
        let simple = TaskProfile {
            complexity: 3,
            priority: Priority::Background,
            realtime: false,
            privacy: false,
        };
        let complex = TaskProfile {
            complexity: 7,
            priority: Priority::Normal,
            realtime: false,
            privacy: false,
        };
        let config = cfg(); // auto, threshold 6

        assert_eq!(decide_route(&simple, &config, status(true, true)), Route::Local);
        assert_eq!(decide_route(&simple, &config, status(false, true)), Route::Cloud);
        assert_eq!(decide_route(&complex, &config, status(true, true)), Route::Cloud);
        assert_eq!(decide_route(&complex, &config, status(true, false)), Route::Local);
    }
}
