fn main() {
    //set the default threadcount for the cli, one worker per zone file up to this.
    const MIN_THREADS: usize = 1;
    let num_threads =
        std::thread::available_parallelism().map_or(MIN_THREADS, core::num::NonZeroUsize::get);

    println!("cargo:rustc-env=THREAD_COUNT={num_threads}");
}
