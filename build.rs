fn main() {
    // Build timestamp in local time, YYYY-MM-DDTHH:MM:SS
    let build_date = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");

    let build_type = match std::env::var("PROFILE").as_deref() {
        Ok("release") => "Release",
        _ => "Debug",
    };

    println!("cargo:rustc-env=GPT_BUILD_DATE={}", build_date);
    println!("cargo:rustc-env=GPT_BUILD_TYPE={}", build_type);
}
