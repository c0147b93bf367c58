mod common;

use common::{init_tracing, temp_config};

#[test]
fn test_temp_config_defaults() {
    init_tracing();
    let config = temp_config("config_smoke");
    assert_eq!(config.web.port, 3000);
    assert!(config.validate().is_ok());
}
