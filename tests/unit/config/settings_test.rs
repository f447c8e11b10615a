// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置设置测试模块
///
/// 测试配置加载和验证功能
/// 确保配置系统能够正确解析和验证各种配置参数

#[cfg(test)]
mod tests {
    use leadrs::config::settings::Settings;

    // Environment mutation stays inside this single test so parallel
    // tests never observe a half-configured process environment.
    #[test]
    fn test_config_loading_from_defaults_and_environment() {
        println!("Testing configuration loading from built-in defaults...");

        match Settings::new() {
            Ok(settings) => {
                println!("✓ Configuration loaded successfully");
                println!("Engine Config:");
                println!(
                    "  Max concurrent pages: {}",
                    settings.engine.max_concurrent_pages
                );
                println!("  Recycle after tasks: {}", settings.engine.recycle_after_tasks);
                println!(
                    "  Navigation timeout: {} ms",
                    settings.engine.navigation_timeout_ms
                );

                println!("\nQueue Config:");
                println!("  Max attempts: {}", settings.queue.max_attempts);
                println!(
                    "  Retry initial delay: {} ms",
                    settings.queue.retry_initial_delay_ms
                );

                println!("\nWorker Config:");
                println!("  Count: {}", settings.worker.count);
                println!("  Poll interval: {} ms", settings.worker.poll_interval_ms);

                println!("\nScreenshot Config:");
                println!("  Output dir: {}", settings.screenshot.output_dir);

                assert_eq!(settings.engine.max_concurrent_pages, 6);
                assert_eq!(settings.engine.recycle_after_tasks, 25);
                assert_eq!(settings.engine.navigation_timeout_ms, 35_000);
                assert_eq!(settings.engine.max_retries, 2);
                assert!(settings.engine.enable_adaptive_scripting);
                assert_eq!(settings.queue.max_attempts, 3);
                assert_eq!(settings.queue.retry_initial_delay_ms, 2_000);
                assert_eq!(settings.queue.sweep_interval_ms, 500);
                assert_eq!(settings.worker.count, 1);
                assert_eq!(settings.worker.poll_interval_ms, 1_000);
                assert_eq!(settings.screenshot.output_dir, "leads");

                println!("\n✓ All configuration sections loaded successfully!");
            }
            Err(e) => {
                panic!("✗ Failed to load configuration: {}", e);
            }
        }

        // Environment variables override the defaults
        std::env::set_var("LEADRS__ENGINE__MAX_CONCURRENT_PAGES", "3");
        std::env::set_var("LEADRS__WORKER__COUNT", "4");
        let overridden = Settings::new().unwrap();
        assert_eq!(overridden.engine.max_concurrent_pages, 3);
        assert_eq!(overridden.worker.count, 4);
        std::env::remove_var("LEADRS__ENGINE__MAX_CONCURRENT_PAGES");
        std::env::remove_var("LEADRS__WORKER__COUNT");

        // Values that fail validation are rejected at load time
        std::env::set_var("LEADRS__QUEUE__MAX_ATTEMPTS", "0");
        assert!(Settings::new().is_err());
        std::env::remove_var("LEADRS__QUEUE__MAX_ATTEMPTS");

        println!("✓ Environment overrides and validation behave as expected");
    }
}
