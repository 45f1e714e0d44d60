pub mod ntp;
