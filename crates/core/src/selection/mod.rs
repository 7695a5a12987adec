pub mod hit_tester;
