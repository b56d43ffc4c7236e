mod extract_tests;
mod restart_tests;
