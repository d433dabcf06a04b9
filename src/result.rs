extern crate anyhow;
extern crate std;

pub type TTWatchResult<T> = anyhow::Result<T>;

pub fn make_error(msg: &str) -> anyhow::Error {
    return anyhow::anyhow!("{}", msg);
}
