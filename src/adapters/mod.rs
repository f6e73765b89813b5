pub mod csv_fixture;
