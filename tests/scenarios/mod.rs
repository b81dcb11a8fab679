mod reset_race_test;
