use std::fs;

use mspquote_core::config::{AppConfig, ConfigOverrides};
use mspquote_core::store::{CatalogSource, LiveCatalog};
use mspquote_document::logo::LogoImage;
use serde::Serialize;

use crate::commands::{open_catalog, CommandContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(context: &CommandContext, json_output: bool) -> String {
    let report = build_report(context);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(context: &CommandContext) -> DoctorReport {
    let mut checks = Vec::new();

    match context.load_config(ConfigOverrides::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match open_catalog(&config) {
                Ok(catalog) => {
                    checks.push(check_catalog_source(&catalog));
                    checks.push(check_catalog_coverage(&catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("catalog_coverage", "catalog did not load"));
                }
            }
            checks.push(check_logo(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("catalog_load", "configuration did not load"));
            checks.push(skipped("catalog_coverage", "configuration did not load"));
            checks.push(skipped("logo_readiness", "configuration did not load"));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let warned = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = match (failed, warned) {
        (true, _) => "doctor: one or more readiness checks failed",
        (false, true) => "doctor: ready, with warnings",
        (false, false) => "doctor: all readiness checks passed",
    }
    .to_string();

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn check_catalog_source(catalog: &LiveCatalog) -> DoctorCheck {
    let override_path = catalog.store().override_path();
    let loaded_override = *catalog.source() == CatalogSource::File(override_path.to_path_buf());
    let override_ignored = override_path.exists() && !loaded_override;

    if override_ignored {
        return DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Warn,
            details: format!(
                "override `{}` exists but is unusable; using {}",
                override_path.display(),
                catalog.source()
            ),
        };
    }

    DoctorCheck {
        name: "catalog_load",
        status: CheckStatus::Pass,
        details: format!(
            "loaded {} entries from {}",
            catalog.catalog().services().len(),
            catalog.source()
        ),
    }
}

fn check_catalog_coverage(catalog: &LiveCatalog) -> DoctorCheck {
    let missing = catalog.catalog().missing_codes();
    let duplicates = catalog.catalog().duplicate_codes();

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("unpriced codes (price 0): {}", missing.join(", ")));
    }
    if !duplicates.is_empty() {
        problems.push(format!("duplicate codes (first entry wins): {}", duplicates.join(", ")));
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "catalog_coverage",
            status: CheckStatus::Pass,
            details: "every recognized price code has exactly one entry".to_string(),
        }
    } else {
        let details = problems.join("; ");
        DoctorCheck { name: "catalog_coverage", status: CheckStatus::Warn, details }
    }
}

fn check_logo(config: &AppConfig) -> DoctorCheck {
    let Some(path) = config.branding.logo_path.as_deref() else {
        return skipped("logo_readiness", "branding.logo_path is not set");
    };

    let result = fs::read(path)
        .map_err(|error| format!("could not read `{}`: {error}", path.display()))
        .and_then(|bytes| {
            LogoImage::decode(&bytes)
                .map_err(|error| format!("could not decode `{}`: {error}", path.display()))
        });

    match result {
        Ok(logo) => DoctorCheck {
            name: "logo_readiness",
            status: CheckStatus::Pass,
            details: format!("{}x{} image at `{}`", logo.width, logo.height, path.display()),
        },
        Err(details) => {
            DoctorCheck { name: "logo_readiness", status: CheckStatus::Warn, details }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
