use colored::*;
use std::time::Duration;

#[derive(Debug)]
pub struct TestResult {
    pub scenario: String,
    pub passed: bool,
    pub message: Option<String>,
    pub duration: Duration,
}

pub fn print_test_summary(results: &[TestResult]) {
    for result in results {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "{} {} ({}ms)",
            status,
            result.scenario,
            result.duration.as_millis()
        );
        if let Some(message) = &result.message {
            println!("    {}", message.dimmed());
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    println!("\n{}/{} scenarios passed", passed, results.len());
}
