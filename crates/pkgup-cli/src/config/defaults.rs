pub fn default_src_dir() -> String {
    "./src".to_string()
}

pub fn default_out_dir() -> String {
    "./dist".to_string()
}
