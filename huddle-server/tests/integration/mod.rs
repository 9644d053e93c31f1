pub mod http_tests;
