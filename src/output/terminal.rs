//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::analysis::DiffusionSummary;

/// Format a summary for human-readable terminal output.
///
/// Uses ANSI colors and a fixed-width layout for clear presentation.
pub fn format_summary(summary: &DiffusionSummary) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("diffusivity\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  Fitted intervals: {}\n", summary.n_points));
    output.push_str(&format!(
        "  D: {:.4e} {} (\u{00B1} {:.4e})\n",
        summary.diffusion_coefficient.value, summary.unit, summary.diffusion_coefficient.uncertainty
    ));
    output.push_str(&format!(
        "  Intercept: {:.4e} (\u{00B1} {:.4e}, ordinate units)\n",
        summary.intercept.value, summary.intercept.uncertainty
    ));
    output.push('\n');

    match (summary.posterior_median, summary.posterior_interval) {
        (Some(median), Some([low, high])) => {
            output.push_str(&format!("  {}\n\n", "\u{2713} Posterior sampled".green().bold()));
            output.push_str(&format!("    Median: {:.4e} {}\n", median, summary.unit));
            output.push_str(&format!(
                "    Credible interval: {:.4e}\u{2013}{:.4e} {}\n",
                low, high, summary.unit
            ));
        }
        _ => {
            output.push_str(&format!(
                "  {}\n",
                "Point estimate only (posterior not yet sampled)".yellow()
            ));
        }
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');

    output.push_str(
        "Note: The point uncertainty is the weighted least squares standard error.\n",
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::VariableEstimate;

    fn make_summary(sampled: bool) -> DiffusionSummary {
        DiffusionSummary {
            diffusion_coefficient: VariableEstimate {
                value: 1.5e-5,
                uncertainty: 2.0e-7,
            },
            intercept: VariableEstimate {
                value: 0.25,
                uncertainty: 0.05,
            },
            posterior_median: if sampled { Some(1.48e-5) } else { None },
            posterior_interval: if sampled { Some([1.1e-5, 1.9e-5]) } else { None },
            unit: "cm^2 s^-1".to_string(),
            n_points: 42,
        }
    }

    #[test]
    fn test_format_point_estimate() {
        let output = format_summary(&make_summary(false));
        assert!(output.contains("diffusivity"));
        assert!(output.contains("Fitted intervals: 42"));
        assert!(output.contains("Point estimate only"));
    }

    #[test]
    fn test_format_sampled_summary() {
        let output = format_summary(&make_summary(true));
        assert!(output.contains("Posterior sampled"));
        assert!(output.contains("Credible interval"));
        assert!(!output.contains("Point estimate only"));
    }
}
