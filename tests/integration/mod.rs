// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod batch_scrape_test;
pub mod browser_engine_test;
pub mod queue_retry_test;
pub mod worker_pipeline_test;
