mod dry_run_tests;
