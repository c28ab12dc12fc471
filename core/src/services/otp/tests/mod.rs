
mod lockout_tests;
